//! Device session error types

use std::time::Duration;

use inkkeys_transport::TransportError;
use thiserror::Error;

/// Errors from device session operations
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Transport layer error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The INFO response did not complete in time
    #[error("No complete device info within {0:?}")]
    HandshakeTimeout(Duration),

    /// The device runs the hardware test firmware and cannot be used
    #[error("Device is running the hardware test firmware; flash the regular firmware to use it")]
    RestrictedFirmware,

    /// Invalid parameter value
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
