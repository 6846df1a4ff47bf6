//! Common types for the transport layer

use std::fmt;

/// A serial port found on the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// OS device path, e.g. `/dev/ttyACM0`
    pub name: String,
    /// USB vendor/product ID, if the port is a USB device
    pub usb: Option<UsbIds>,
    /// Product string reported by the USB descriptor
    pub product: Option<String>,
}

/// USB vendor/product identifier pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsbIds {
    pub vid: u16,
    pub pid: u16,
}

impl PortInfo {
    /// Check whether this port carries the given VID/PID
    pub fn matches(&self, vid: u16, pid: u16) -> bool {
        self.usb.is_some_and(|ids| ids.vid == vid && ids.pid == pid)
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.usb {
            Some(ids) => write!(f, "{} [{:04X}:{:04X}]", self.name, ids.vid, ids.pid)?,
            None => write!(f, "{}", self.name)?,
        }
        if let Some(product) = &self.product {
            write!(f, " {product}")?;
        }
        Ok(())
    }
}
