//! Inbound line framing
//!
//! Bytes arrive in arbitrary chunks. [`LineBuffer`] keeps whatever has not
//! yet formed a complete line and hands out one line at a time. Each byte is
//! decoded as the ISO-8859-1 code point of the same value, so nothing is
//! lost or rejected regardless of content.

/// Receive buffer that splits a byte stream into `\n` terminated lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Take the next complete line, without its terminator and with all `\r` removed
    pub fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: String = self
            .pending
            .drain(..=end)
            .take(end)
            .filter(|&b| b != b'\r')
            .map(char::from)
            .collect();
        Some(line)
    }

    /// Number of buffered bytes not yet returned as a line
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
