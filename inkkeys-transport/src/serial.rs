//! Line-oriented serial transport
//!
//! ```text
//! [ByteStream]  ← serial port (or scripted stream in tests)
//!      |
//! [SerialTransport]  ← framing, chunked binary writes, response lock
//!      |
//! [DeviceSession]
//! ```
//!
//! The response lock serializes "send a command, then wait for its reply"
//! sections. The per-tick event poll takes the same lock, so a key event
//! that arrives while a reply is awaited stays queued for the poll instead
//! of being consumed by the waiting section.

use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::thread;
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::framing::LineBuffer;
use crate::protocol::timing;
use crate::stream::ByteStream;

struct Link {
    stream: Box<dyn ByteStream>,
    inbound: LineBuffer,
    /// Complete lines set aside by a response section, handed out before new ones
    deferred: VecDeque<String>,
}

impl Link {
    fn write_within(&mut self, mut buf: &[u8], deadline: Instant) -> Result<(), TransportError> {
        while !buf.is_empty() {
            match self.stream.write(buf) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => buf = &buf[n..],
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    if Instant::now() >= deadline {
                        return Err(TransportError::Timeout);
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        if let Some(line) = self.deferred.pop_front() {
            return Ok(Some(line));
        }
        if let Some(line) = self.inbound.next_line() {
            return Ok(Some(line));
        }

        let available = self.stream.bytes_available()?;
        if available > 0 {
            let mut buf = vec![0u8; available];
            let n = match self.stream.read(&mut buf) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::TimedOut => 0,
                Err(e) => return Err(e.into()),
            };
            self.inbound.extend(&buf[..n]);
        }
        Ok(self.inbound.next_line())
    }
}

/// Serial connection to the keyboard
pub struct SerialTransport {
    address: String,
    link: Mutex<Option<Link>>,
    response_lock: Mutex<()>,
}

impl SerialTransport {
    /// Open the serial port at `address`
    pub fn open(address: &str) -> Result<Self, TransportError> {
        info!("Opening {} at {} baud", address, timing::BAUD_RATE);
        let port = serialport::new(address, timing::BAUD_RATE)
            .timeout(timing::READ_TIMEOUT)
            .open()
            .map_err(|source| TransportError::Open {
                address: address.to_string(),
                source,
            })?;
        Ok(Self::from_stream(address, Box::new(port)))
    }

    /// Wrap an already opened byte stream
    pub fn from_stream(address: &str, stream: Box<dyn ByteStream>) -> Self {
        Self {
            address: address.to_string(),
            link: Mutex::new(Some(Link {
                stream,
                inbound: LineBuffer::new(),
                deferred: VecDeque::new(),
            })),
            response_lock: Mutex::new(()),
        }
    }

    /// Address the transport was opened on
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_open(&self) -> bool {
        self.link.lock().is_some()
    }

    /// Drop the stream. Later operations fail with [`TransportError::Disconnected`].
    pub fn close(&self) {
        if self.link.lock().take().is_some() {
            info!("Closed {}", self.address);
        }
    }

    fn with_link<T>(
        &self,
        f: impl FnOnce(&mut Link) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let mut guard = self.link.lock();
        let link = guard.as_mut().ok_or(TransportError::Disconnected)?;
        f(link)
    }

    /// Send one command line; a newline is appended and the stream flushed
    pub fn send_line(&self, text: &str) -> Result<(), TransportError> {
        debug!("Sending: {}", text);
        let deadline = Instant::now() + timing::WRITE_TIMEOUT;
        let mut frame = Vec::with_capacity(text.len() + 1);
        frame.extend_from_slice(text.as_bytes());
        frame.push(b'\n');
        self.with_link(|link| {
            link.write_within(&frame, deadline)?;
            link.stream.flush()?;
            Ok(())
        })
    }

    /// Send a raw payload in [`timing::CHUNK_SIZE`] byte chunks
    pub fn send_binary(&self, data: &[u8]) -> Result<(), TransportError> {
        debug!("Sending {} bytes of binary data", data.len());
        self.with_link(|link| {
            for chunk in data.chunks(timing::CHUNK_SIZE) {
                let deadline = Instant::now() + timing::WRITE_TIMEOUT;
                link.write_within(chunk, deadline)?;
                link.stream.flush()?;
            }
            Ok(())
        })
    }

    /// Return the next complete inbound line, or `None` if none is buffered yet
    ///
    /// Never blocks waiting for data. Callers that dispatch events should hold
    /// a [`ResponseSection`] while reading.
    pub fn read_line(&self) -> Result<Option<String>, TransportError> {
        self.with_link(Link::read_line)
    }

    /// Enter an exclusive response section, blocking until no other section is active
    pub fn begin_response(&self) -> ResponseSection<'_> {
        ResponseSection {
            transport: self,
            _guard: self.response_lock.lock(),
            skipped: Vec::new(),
        }
    }

    /// Enter an exclusive response section only if none is active
    pub fn try_begin_response(&self) -> Option<ResponseSection<'_>> {
        self.response_lock.try_lock().map(|guard| ResponseSection {
            transport: self,
            _guard: guard,
            skipped: Vec::new(),
        })
    }
}

/// Holds the transport's response lock for a command/reply exchange
///
/// Lines read by [`wait_for_line`](Self::wait_for_line) that the caller did
/// not accept are put back in front of the queue when the section ends.
pub struct ResponseSection<'a> {
    transport: &'a SerialTransport,
    _guard: MutexGuard<'a, ()>,
    skipped: Vec<String>,
}

impl ResponseSection<'_> {
    pub fn send_line(&self, text: &str) -> Result<(), TransportError> {
        self.transport.send_line(text)
    }

    pub fn send_binary(&self, data: &[u8]) -> Result<(), TransportError> {
        self.transport.send_binary(data)
    }

    pub fn read_line(&self) -> Result<Option<String>, TransportError> {
        self.transport.read_line()
    }

    /// Poll for a line accepted by `accept` until `deadline`
    ///
    /// Returns `Ok(None)` once the deadline passes without an accepted line.
    /// Sleeps [`timing::RESPONSE_POLL_INTERVAL`] whenever nothing is buffered.
    pub fn wait_for_line<F>(
        &mut self,
        mut accept: F,
        deadline: Instant,
    ) -> Result<Option<String>, TransportError>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            match self.transport.read_line()? {
                Some(line) if accept(&line) => return Ok(Some(line)),
                Some(line) => {
                    debug!("Deferring line while awaiting response: {:?}", line);
                    self.skipped.push(line);
                }
                None => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    thread::sleep(timing::RESPONSE_POLL_INTERVAL.min(deadline - now));
                }
            }
        }
    }
}

impl Drop for ResponseSection<'_> {
    fn drop(&mut self) {
        if self.skipped.is_empty() {
            return;
        }
        let mut guard = self.transport.link.lock();
        if let Some(link) = guard.as_mut() {
            let mut restored: VecDeque<String> = self.skipped.drain(..).collect();
            restored.extend(link.deferred.drain(..));
            link.deferred = restored;
        }
    }
}
