//! Serial transport for the Inkkeys e-ink macro keyboard
//!
//! The keyboard enumerates as a USB CDC serial port and speaks a
//! line-oriented ASCII protocol, with raw bitmap payloads following DISPLAY
//! commands. This crate owns the byte stream:
//!
//! - framing inbound bytes into lines ([`LineBuffer`])
//! - writing command lines and chunked binary payloads ([`SerialTransport`])
//! - serializing command/reply exchanges ([`ResponseSection`])
//! - finding the keyboard among the host's serial ports ([`SerialDiscovery`])

pub mod device_registry;
pub mod error;
pub mod framing;
pub mod protocol;
pub mod types;

mod discovery;
mod serial;
mod stream;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use device_registry::{is_inkkeys, PRODUCT_ID, VENDOR_ID};
pub use discovery::SerialDiscovery;
pub use error::TransportError;
pub use framing::LineBuffer;
pub use serial::{ResponseSection, SerialTransport};
pub use stream::ByteStream;
pub use types::{PortInfo, UsbIds};
