//! Byte stream seam between the transport and the OS serial port

use std::io::{self, Read, Write};

use serialport::SerialPort;

/// A bidirectional byte stream that can report how many bytes are ready to read
///
/// Implemented for opened serial ports. Tests substitute an in-memory stream.
pub trait ByteStream: Read + Write + Send {
    /// Number of bytes that can be read without blocking
    fn bytes_available(&mut self) -> io::Result<usize>;
}

impl ByteStream for Box<dyn SerialPort> {
    fn bytes_available(&mut self) -> io::Result<usize> {
        self.bytes_to_read()
            .map(|n| n as usize)
            .map_err(io::Error::from)
    }
}
