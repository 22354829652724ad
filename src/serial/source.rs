//! Line sources
//!
//! The ingestion loop reads from a `LineSource`. The serial implementation
//! wraps a `serialport` handle; any other `Read` (a file, a pipe, a test
//! fixture) can be framed the same way.

use std::io::{self, Read};

use crate::error::{Error, Result};

use super::config::SerialConfig;
use super::framer::LineFramer;
use super::state::{LinkState, LinkStatus};

/// Result of one read attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, trimmed
    Line(String),
    /// Nothing arrived before the read timeout
    Idle,
    /// The source has ended and will produce nothing more
    Closed,
}

/// A blocking producer of text lines
///
/// `read_line` may block, but should return `Idle` periodically so the caller
/// can check for a stop request.
pub trait LineSource: Send + 'static {
    /// Read the next line
    fn read_line(&mut self) -> io::Result<ReadOutcome>;

    /// Human-readable name for logs
    fn describe(&self) -> String;

    /// Overlong lines dropped so far
    fn discarded_lines(&self) -> u64 {
        0
    }
}

/// Frames any byte reader into lines
pub struct FramedSource<R> {
    reader: R,
    name: String,
    framer: LineFramer,
    buf: Box<[u8]>,
    /// Whether a zero-length read means end of stream. Serial ports report
    /// zero bytes on some platforms when nothing is available.
    eof_is_closed: bool,
    closed: bool,
}

impl<R: Read + Send + 'static> FramedSource<R> {
    /// Frame a reader whose zero-length read means end of stream
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        Self::with_framer(reader, name, LineFramer::default(), true)
    }

    fn with_framer(reader: R, name: impl Into<String>, framer: LineFramer, eof_is_closed: bool) -> Self {
        Self {
            reader,
            name: name.into(),
            framer,
            buf: vec![0u8; 1024].into_boxed_slice(),
            eof_is_closed,
            closed: false,
        }
    }
}

impl<R: Read + Send + 'static> LineSource for FramedSource<R> {
    fn read_line(&mut self) -> io::Result<ReadOutcome> {
        if let Some(line) = self.framer.next_line() {
            return Ok(ReadOutcome::Line(line));
        }
        if self.closed {
            return Ok(ReadOutcome::Closed);
        }

        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) if self.eof_is_closed => {
                    self.closed = true;
                    return Ok(match self.framer.finish() {
                        Some(line) => ReadOutcome::Line(line),
                        None => ReadOutcome::Closed,
                    });
                }
                Ok(0) => return Ok(ReadOutcome::Idle),
                Ok(n) => {
                    self.framer.push(&self.buf[..n]);
                    if let Some(line) = self.framer.next_line() {
                        return Ok(ReadOutcome::Line(line));
                    }
                }
                Err(e) if is_idle(&e) => return Ok(ReadOutcome::Idle),
                Err(e) => return Err(e),
            }
        }
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn discarded_lines(&self) -> u64 {
        self.framer.discarded()
    }
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Line source backed by a serial port
pub type SerialLineSource = FramedSource<Box<dyn serialport::SerialPort>>;

/// Open the serial device
///
/// Moves `link` through `Connecting`; on success the link is left in
/// `Connecting` until the ingestion loop starts reading, on failure it returns
/// to `Disconnected` and `Error::DeviceOpen` is returned. No retry is made.
pub fn open(config: &SerialConfig, link: &LinkStatus) -> Result<SerialLineSource> {
    link.set(LinkState::Connecting);

    let port = serialport::new(&config.path, config.baud_rate)
        .timeout(config.read_timeout)
        .open();

    match port {
        Ok(port) => {
            tracing::info!(
                port = %config.path,
                baud = config.baud_rate,
                "Serial device opened"
            );
            Ok(FramedSource::with_framer(
                port,
                config.path.clone(),
                LineFramer::new(config.max_line_len),
                false,
            ))
        }
        Err(source) => {
            link.set(LinkState::Disconnected);
            Err(Error::DeviceOpen {
                path: config.path.clone(),
                source,
            })
        }
    }
}
