//! Command handlers for the CLI application.
//!
//! - `query`: read-only commands (list, info)
//! - `keymap`: one-off key assignment (assign)
//! - `utility`: the long-running driver (run)

pub mod keymap;
pub mod query;
pub mod utility;

use inkkeys_device::{DeviceSession, SerialDiscovery, StatusCell};
use tracing::warn;

use inkkeys_driver::config::Config;
use inkkeys_driver::supervisor::{Connector, SerialConnector};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Discovery for the configured USB IDs
pub fn discovery(config: &Config) -> SerialDiscovery {
    SerialDiscovery::with_ids(config.vid, config.pid)
}

pub fn connector(config: &Config, status: StatusCell) -> SerialConnector {
    SerialConnector::new(discovery(config), config.port.clone(), status)
}

/// Connect to the first usable keyboard and run a closure with the session.
/// Prints an error and returns Ok(()) if no device is found.
pub fn with_session<F>(config: &Config, f: F) -> CommandResult
where
    F: FnOnce(&mut DeviceSession) -> CommandResult,
{
    let mut connector = connector(config, StatusCell::new());
    for address in connector.candidates()? {
        match connector.connect(&address) {
            Ok(mut session) => {
                let result = f(&mut session);
                session.close();
                return result;
            }
            Err(e) => warn!("Could not use {}: {:#}", address, anyhow::Error::from(e)),
        }
    }
    eprintln!("No device found");
    Ok(())
}
