//! Per-key handlers for inbound key events
//!
//! Handlers receive the session mutably so they can issue commands. While a
//! handler runs it is taken out of the table; it goes back afterwards unless
//! its slot was changed or the table was cleared in the meantime.

use std::collections::HashMap;
use std::fmt;

use crate::error::DeviceError;
use crate::keys::KeyCode;
use crate::session::DeviceSession;

pub type KeyHandler = Box<dyn FnMut(&mut DeviceSession) -> Result<(), DeviceError>>;
pub type JogHandler = Box<dyn FnMut(&mut DeviceSession, i32) -> Result<(), DeviceError>>;

/// A registered handler
pub enum Callback {
    /// Invoked when the key's identifier arrives on its own line
    Key(KeyHandler),
    /// Invoked with the step delta of a jog rotation event
    Jog(JogHandler),
}

impl Callback {
    pub fn key<F>(f: F) -> Self
    where
        F: FnMut(&mut DeviceSession) -> Result<(), DeviceError> + 'static,
    {
        Self::Key(Box::new(f))
    }

    pub fn jog<F>(f: F) -> Self
    where
        F: FnMut(&mut DeviceSession, i32) -> Result<(), DeviceError> + 'static,
    {
        Self::Jog(Box::new(f))
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(_) => f.write_str("Callback::Key"),
            Self::Jog(_) => f.write_str("Callback::Jog"),
        }
    }
}

/// At most one handler per key
#[derive(Debug, Default)]
pub struct CallbackTable {
    handlers: HashMap<KeyCode, Callback>,
    /// Key whose handler is currently running, and whether its slot was touched since
    in_flight: Option<(KeyCode, bool)>,
}

impl CallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `key`, replacing any previous handler
    pub fn register(&mut self, key: KeyCode, callback: Callback) {
        self.touch(key);
        self.handlers.insert(key, callback);
    }

    /// Remove the handler for `key`
    pub fn clear(&mut self, key: KeyCode) {
        self.touch(key);
        self.handlers.remove(&key);
    }

    /// Remove every handler
    pub fn clear_all(&mut self) {
        if let Some((_, touched)) = self.in_flight.as_mut() {
            *touched = true;
        }
        self.handlers.clear();
    }

    pub fn contains(&self, key: KeyCode) -> bool {
        self.handlers.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn touch(&mut self, key: KeyCode) {
        if let Some((k, touched)) = self.in_flight.as_mut() {
            if *k == key {
                *touched = true;
            }
        }
    }

    /// Take a handler out for invocation
    pub(crate) fn take(&mut self, key: KeyCode) -> Option<Callback> {
        let callback = self.handlers.remove(&key)?;
        self.in_flight = Some((key, false));
        Some(callback)
    }

    /// Return a handler after invocation, unless its slot changed meanwhile
    pub(crate) fn restore(&mut self, key: KeyCode, callback: Callback) {
        if let Some((k, touched)) = self.in_flight.take() {
            if k == key && !touched {
                self.handlers.insert(key, callback);
            }
        }
    }
}
