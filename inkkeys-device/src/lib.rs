//! Device session for the Inkkeys e-ink macro keyboard
//!
//! Builds the keyboard's command vocabulary on top of
//! [`inkkeys_transport`]: the INFO handshake, key assignment, LEDs with a
//! timed fade, display regions with refresh replay, and dispatch of inbound
//! key events to registered callbacks.

pub mod callbacks;
pub mod display;
pub mod error;
pub mod input;
pub mod keys;
pub mod led;
pub mod session;
pub mod status;

pub use callbacks::{Callback, CallbackTable};
pub use display::{Area, Bitmap, DisplayLayout, ImageRegion, Region};
pub use error::DeviceError;
pub use input::{ActionCode, DeviceCode, InputEvent};
pub use keys::{KeyCode, KeyEvent, SWITCH_COUNT};
pub use led::{LedAnimation, RgbColor};
pub use session::{DeviceCapabilities, DeviceSession, SessionState};
pub use status::StatusCell;

pub use inkkeys_transport::{SerialDiscovery, SerialTransport, TransportError};
