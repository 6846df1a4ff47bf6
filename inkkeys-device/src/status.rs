//! Externally pushed status shared with the scheduler thread

use std::sync::Arc;

use parking_lot::Mutex;

/// Single status slot written by the HTTP listener and read by modes
///
/// Last write wins. Readers see either the old or the new value, never a
/// partial one, since every access goes through the mutex.
#[derive(Debug, Clone, Default)]
pub struct StatusCell {
    inner: Arc<Mutex<String>>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status
    pub fn set(&self, status: impl Into<String>) {
        *self.inner.lock() = status.into();
    }

    /// Current status; empty when unset
    pub fn get(&self) -> String {
        self.inner.lock().clone()
    }

    /// Read and clear the status, `None` if it was empty
    pub fn take(&self) -> Option<String> {
        let status = std::mem::take(&mut *self.inner.lock());
        (!status.is_empty()).then_some(status)
    }
}
