//! Serial device configuration

use std::time::Duration;

use crate::error::{Error, Result};

/// Default baud rate for the timer device
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial port settings, fixed at startup
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyACM0` or `COM3`)
    pub path: String,

    /// Baud rate
    pub baud_rate: u32,

    /// Read timeout; bounds how long the loop waits before checking for stop
    pub read_timeout: Duration,

    /// Longest line kept while waiting for a newline; longer input is discarded
    pub max_line_len: usize,
}

impl SerialConfig {
    /// Create a config for the given device path with default settings
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
            max_line_len: 4096,
        }
    }

    /// Set the baud rate
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the maximum buffered line length
    pub fn max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(Error::Config("serial device path is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud rate must be non-zero".into()));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::Config("read timeout must be non-zero".into()));
        }
        if self.max_line_len == 0 {
            return Err(Error::Config("max line length must be non-zero".into()));
        }
        Ok(())
    }
}

/// What the ingestion loop does about failed reads
///
/// The default never gives up: each failure is logged and the loop keeps
/// reading. With `max_consecutive_errors` set, that many failures in a row
/// (with no successful read in between) end the loop with `Error::DeviceLost`.
#[derive(Debug, Clone)]
pub struct ReadErrorPolicy {
    /// Give up after this many consecutive failures (`None` = never)
    pub max_consecutive_errors: Option<u32>,

    /// Pause after each failure before reading again
    pub error_backoff: Duration,
}

impl Default for ReadErrorPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_errors: None,
            error_backoff: Duration::from_millis(100),
        }
    }
}

impl ReadErrorPolicy {
    /// Escalate after `max` consecutive read errors
    pub fn give_up_after(mut self, max: u32) -> Self {
        self.max_consecutive_errors = Some(max.max(1));
        self
    }

    /// Set the pause after a failed read
    pub fn error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Whether `consecutive` failures exceed the policy
    pub fn should_give_up(&self, consecutive: u32) -> bool {
        self.max_consecutive_errors
            .is_some_and(|max| consecutive >= max)
    }
}
