//! Reconnect supervisor
//!
//! Finds the keyboard, runs the handshake, hands the session to the
//! caller's work loop, and starts over after a fixed delay whenever
//! anything fails. Only clearing the running flag ends the loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use inkkeys_device::{DeviceError, DeviceSession, SerialDiscovery, SerialTransport, StatusCell};
use inkkeys_transport::protocol::timing;
use inkkeys_transport::TransportError;
use tracing::{error, info, warn};

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Longest uninterrupted sleep while waiting to retry
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// Where sessions come from
pub trait Connector {
    /// Addresses to try, in order
    fn candidates(&mut self) -> Result<Vec<String>, TransportError>;

    /// Open `address` and complete the handshake
    fn connect(&mut self, address: &str) -> Result<DeviceSession, DeviceError>;
}

/// Opens serial ports, either one explicit address or every VID/PID match
pub struct SerialConnector {
    discovery: SerialDiscovery,
    port: Option<String>,
    status: StatusCell,
    handshake_timeout: Duration,
}

impl SerialConnector {
    pub fn new(discovery: SerialDiscovery, port: Option<String>, status: StatusCell) -> Self {
        Self {
            discovery,
            port,
            status,
            handshake_timeout: timing::HANDSHAKE_TIMEOUT,
        }
    }
}

impl Connector for SerialConnector {
    fn candidates(&mut self) -> Result<Vec<String>, TransportError> {
        if let Some(port) = &self.port {
            return Ok(vec![port.clone()]);
        }
        Ok(self
            .discovery
            .candidates()?
            .into_iter()
            .map(|p| p.name)
            .collect())
    }

    fn connect(&mut self, address: &str) -> Result<DeviceSession, DeviceError> {
        let transport = SerialTransport::open(address)?;
        DeviceSession::connect(transport, self.status.clone(), self.handshake_timeout)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Retry loop around session establishment
pub struct Supervisor<C> {
    connector: C,
    retry_delay: Duration,
    running: Arc<AtomicBool>,
    attempts: u64,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, running: Arc<AtomicBool>) -> Self {
        Self {
            connector,
            retry_delay: DEFAULT_RETRY_DELAY,
            running,
            attempts: 0,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Number of discovery passes so far
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Keep a session alive until cancelled
    ///
    /// `work` runs once per established session; its return, error, or
    /// panic all lead to a reconnect unless the running flag was cleared.
    pub fn run<F>(&mut self, mut work: F)
    where
        F: FnMut(&mut DeviceSession) -> Result<(), DeviceError>,
    {
        while self.is_running() {
            if let Some(mut session) = self.establish() {
                match panic::catch_unwind(AssertUnwindSafe(|| {
                    session.reset_display()?;
                    work(&mut session)
                })) {
                    Ok(Ok(())) => info!("Session ended"),
                    Ok(Err(e)) => error!("Session failed: {:#}", anyhow::Error::from(e)),
                    Err(payload) => error!("Session panicked: {}", panic_message(&*payload)),
                }
                session.close();
            }

            if !self.is_running() {
                break;
            }
            info!("I will retry in {:?}...", self.retry_delay);
            self.sleep(self.retry_delay);
        }
        info!("Supervisor stopped");
    }

    /// One discovery pass; the first address that completes a handshake wins
    fn establish(&mut self) -> Option<DeviceSession> {
        self.attempts += 1;
        let addresses = match self.connector.candidates() {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!("Port enumeration failed: {:#}", anyhow::Error::from(e));
                return None;
            }
        };
        if addresses.is_empty() {
            warn!("No keyboard found");
        }

        for address in addresses {
            match self.connector.connect(&address) {
                Ok(session) => {
                    info!("Connected to controller on {}", address);
                    return Some(session);
                }
                Err(e) => warn!("Could not use {}: {:#}", address, anyhow::Error::from(e)),
            }
            if !self.is_running() {
                break;
            }
        }
        None
    }

    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(CANCEL_CHECK_INTERVAL.min(deadline - now));
        }
    }
}
