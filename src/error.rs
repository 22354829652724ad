//! Error types
//!
//! Only failures that must reach the process boundary are represented here.
//! Parse mismatches and per-observer delivery failures are handled where they
//! happen and never become an `Error`.

use std::net::SocketAddr;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for relay operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The serial device could not be opened at startup
    #[error("failed to open serial device {path}: {source}")]
    DeviceOpen {
        path: String,
        #[source]
        source: serialport::Error,
    },

    /// The read error policy gave up on the device
    #[error("serial device lost after {consecutive_errors} consecutive read errors: {last}")]
    DeviceLost {
        consecutive_errors: u32,
        #[source]
        last: std::io::Error,
    },

    /// The HTTP listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The ingestion task panicked or was aborted
    #[error("ingestion task failed: {0}")]
    Task(String),

    /// Other I/O failure
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_lost_display() {
        let err = Error::DeviceLost {
            consecutive_errors: 5,
            last: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"),
        };

        assert_eq!(
            err.to_string(),
            "serial device lost after 5 consecutive read errors: gone"
        );
    }

    #[test]
    fn test_bind_display() {
        let err = Error::Bind {
            addr: "127.0.0.1:5000".parse().unwrap(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "in use"),
        };

        assert_eq!(err.to_string(), "failed to bind 127.0.0.1:5000: in use");
    }
}
