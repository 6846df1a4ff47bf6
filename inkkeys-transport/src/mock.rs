//! Scripted in-memory byte stream for tests without hardware
//!
//! ```
//! use inkkeys_transport::mock::ScriptedStream;
//! use inkkeys_transport::SerialTransport;
//!
//! let (stream, handle) = ScriptedStream::new();
//! handle.reply_to("R f", &["ok"]);
//! let transport = SerialTransport::from_stream("mock", Box::new(stream));
//! transport.send_line("R f").unwrap();
//! assert_eq!(transport.read_line().unwrap().as_deref(), Some("ok"));
//! ```

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::stream::ByteStream;

struct Trigger {
    prefix: String,
    reply: Vec<u8>,
    once: bool,
}

#[derive(Default)]
struct MockState {
    inbound: VecDeque<u8>,
    /// Every individual `write` call, in order
    writes: Vec<Vec<u8>>,
    triggers: Vec<Trigger>,
    broken: bool,
}

impl MockState {
    fn fire_triggers(&mut self, line: &str) {
        if let Some(idx) = self.triggers.iter().position(|t| line.starts_with(&t.prefix)) {
            let reply = if self.triggers[idx].once {
                self.triggers.remove(idx).reply
            } else {
                self.triggers[idx].reply.clone()
            };
            self.inbound.extend(reply);
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Byte stream half handed to the transport
pub struct ScriptedStream {
    state: Arc<Mutex<MockState>>,
}

/// Test-side handle for feeding and inspecting a [`ScriptedStream`]
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl ScriptedStream {
    pub fn new() -> (Self, MockHandle) {
        let state = Arc::new(Mutex::new(MockState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockHandle { state },
        )
    }
}

fn lines_to_bytes(lines: &[&str]) -> Vec<u8> {
    lines
        .iter()
        .flat_map(|l| l.bytes().chain(std::iter::once(b'\n')))
        .collect()
}

impl MockHandle {
    /// Queue raw inbound bytes
    pub fn push_inbound(&self, bytes: &[u8]) {
        self.state.lock().inbound.extend(bytes.iter().copied());
    }

    /// Queue inbound lines, each terminated with `\n`
    pub fn push_lines(&self, lines: &[&str]) {
        self.push_inbound(&lines_to_bytes(lines));
    }

    /// Reply with `lines` every time an outbound line starting with `prefix` is written
    pub fn reply_to(&self, prefix: &str, lines: &[&str]) {
        self.state.lock().triggers.push(Trigger {
            prefix: prefix.to_string(),
            reply: lines_to_bytes(lines),
            once: false,
        });
    }

    /// Reply with `lines` the first time an outbound line starting with `prefix` is written
    pub fn reply_once(&self, prefix: &str, lines: &[&str]) {
        self.state.lock().triggers.push(Trigger {
            prefix: prefix.to_string(),
            reply: lines_to_bytes(lines),
            once: true,
        });
    }

    /// Everything written so far
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().writes.concat()
    }

    /// Command lines written so far, without their terminator
    ///
    /// A command line is a single write ending in `\n`; binary payload
    /// chunks are not included.
    pub fn written_lines(&self) -> Vec<String> {
        self.state
            .lock()
            .writes
            .iter()
            .filter_map(|w| w.strip_suffix(b"\n"))
            .map(decode)
            .collect()
    }

    /// Size of every individual `write` call
    pub fn write_sizes(&self) -> Vec<usize> {
        self.state.lock().writes.iter().map(Vec::len).collect()
    }

    pub fn clear_written(&self) {
        self.state.lock().writes.clear();
    }

    /// Make every following read and write fail as if the cable was pulled
    pub fn disconnect(&self) {
        self.state.lock().broken = true;
    }
}

fn broken_pipe() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged")
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.broken {
            return Err(broken_pipe());
        }
        let n = buf.len().min(state.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.broken {
            return Err(broken_pipe());
        }
        state.writes.push(buf.to_vec());
        if let Some(line) = buf.strip_suffix(b"\n") {
            let line = decode(line);
            state.fire_triggers(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.state.lock().broken {
            return Err(broken_pipe());
        }
        Ok(())
    }
}

impl ByteStream for ScriptedStream {
    fn bytes_available(&mut self) -> io::Result<usize> {
        let state = self.state.lock();
        if state.broken {
            return Err(broken_pipe());
        }
        Ok(state.inbound.len())
    }
}
