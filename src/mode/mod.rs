//! Modes: one UI configuration of the keyboard per context
//!
//! A mode owns its private state and talks to the device only through the
//! session it is handed. The scheduler decides which mode is active and
//! calls the hooks below:
//!
//! - `activate`: draw every region and bind every key
//! - `poll`: periodic work; returns when to be polled next
//! - `animate`: called every tick, must stay cheap
//! - `deactivate`: clean up before another mode takes over

pub mod blender;
pub mod fallback;
pub mod gimp;
pub mod panel;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use inkkeys_device::{DeviceError, DeviceSession};

use crate::error::ConfigError;
use crate::render::Renderer;

pub use blender::BlenderMode;
pub use fallback::{FallbackMode, FallbackVariant};
pub use gimp::{GimpMode, JogFunction};
pub use panel::{Button, Label, Panel};

/// Behavior of one mode
pub trait Mode {
    /// Human readable name for logs
    fn name(&self) -> &str;

    /// Take over the device. Every button region and the title must be
    /// left in a defined state.
    fn activate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError>;

    /// Release the device; registered callbacks must not survive this call
    fn deactivate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError>;

    /// Periodic work; the returned delay is the minimum time until the next
    /// call, `None` stops polling until the mode is activated again
    fn poll(&mut self, session: &mut DeviceSession) -> Result<Option<Duration>, DeviceError>;

    /// Per-tick animation
    fn animate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError>;
}

/// The built-in modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeName {
    Blender,
    Gimp,
    Fallback,
    MiniFallback,
}

impl ModeName {
    pub const ALL: [ModeName; 4] = [
        ModeName::Blender,
        ModeName::Gimp,
        ModeName::Fallback,
        ModeName::MiniFallback,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blender => "blender",
            Self::Gimp => "gimp",
            Self::Fallback => "fallback",
            Self::MiniFallback => "mini-fallback",
        }
    }
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .or_else(|| match s.to_ascii_lowercase().as_str() {
                "minifallback" | "mini_fallback" | "mac-mini" => Some(Self::MiniFallback),
                "default" => Some(Self::Fallback),
                _ => None,
            })
            .ok_or_else(|| ConfigError::UnknownMode(s.to_string()))
    }
}

/// Closed set of mode implementations
pub enum ModeKind {
    Blender(BlenderMode),
    Gimp(GimpMode),
    Fallback(FallbackMode),
}

impl ModeKind {
    pub fn new(name: ModeName, renderer: Renderer) -> Self {
        match name {
            ModeName::Blender => Self::Blender(BlenderMode::new(renderer)),
            ModeName::Gimp => Self::Gimp(GimpMode::new(renderer)),
            ModeName::Fallback => {
                Self::Fallback(FallbackMode::new(FallbackVariant::Default, renderer))
            }
            ModeName::MiniFallback => {
                Self::Fallback(FallbackMode::new(FallbackVariant::MacMini, renderer))
            }
        }
    }

    fn inner(&mut self) -> &mut dyn Mode {
        match self {
            Self::Blender(m) => m,
            Self::Gimp(m) => m,
            Self::Fallback(m) => m,
        }
    }
}

impl Mode for ModeKind {
    fn name(&self) -> &str {
        match self {
            Self::Blender(m) => m.name(),
            Self::Gimp(m) => m.name(),
            Self::Fallback(m) => m.name(),
        }
    }

    fn activate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.inner().activate(session)
    }

    fn deactivate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.inner().deactivate(session)
    }

    fn poll(&mut self, session: &mut DeviceSession) -> Result<Option<Duration>, DeviceError> {
        self.inner().poll(session)
    }

    fn animate(&mut self, session: &mut DeviceSession) -> Result<(), DeviceError> {
        self.inner().animate(session)
    }
}
