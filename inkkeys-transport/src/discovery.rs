//! Serial port discovery for the keyboard

use serialport::SerialPortType;
use tracing::{debug, info};

use crate::device_registry::{PRODUCT_ID, VENDOR_ID};
use crate::error::TransportError;
use crate::serial::SerialTransport;
use crate::types::{PortInfo, UsbIds};

/// Finds serial ports whose USB identifiers match a known device
pub struct SerialDiscovery {
    /// Known VID/PID pairs to look for
    known_devices: Vec<(u16, u16)>,
}

impl Default for SerialDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialDiscovery {
    pub fn new() -> Self {
        Self {
            known_devices: vec![(VENDOR_ID, PRODUCT_ID)],
        }
    }

    /// Discovery for a single, explicitly configured VID/PID pair
    pub fn with_ids(vid: u16, pid: u16) -> Self {
        Self {
            known_devices: vec![(vid, pid)],
        }
    }

    fn is_known(&self, port: &PortInfo) -> bool {
        self.known_devices
            .iter()
            .any(|&(vid, pid)| port.matches(vid, pid))
    }

    /// List every serial port on the host, in enumeration order
    pub fn list_ports(&self) -> Result<Vec<PortInfo>, TransportError> {
        let ports = serialport::available_ports()?
            .into_iter()
            .map(|p| {
                let (usb, product) = match p.port_type {
                    SerialPortType::UsbPort(usb) => (
                        Some(UsbIds {
                            vid: usb.vid,
                            pid: usb.pid,
                        }),
                        usb.product,
                    ),
                    _ => (None, None),
                };
                PortInfo {
                    name: p.port_name,
                    usb,
                    product,
                }
            })
            .collect();
        Ok(ports)
    }

    /// Ports carrying a known VID/PID, in enumeration order
    pub fn candidates(&self) -> Result<Vec<PortInfo>, TransportError> {
        let ports: Vec<PortInfo> = self
            .list_ports()?
            .into_iter()
            .filter(|p| {
                let known = self.is_known(p);
                if !known {
                    debug!("Skipping {}", p);
                }
                known
            })
            .collect();
        info!("Found {} candidate port(s)", ports.len());
        Ok(ports)
    }

    /// Open a transport on the given port
    pub fn open(&self, port: &PortInfo) -> Result<SerialTransport, TransportError> {
        SerialTransport::open(&port.name)
    }
}
