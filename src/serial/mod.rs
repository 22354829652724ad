//! Serial device input
//!
//! This module provides:
//! - Device configuration and the read error policy
//! - Newline framing of the raw byte stream
//! - The `LineSource` abstraction and its serial implementation
//! - The observable link state machine

pub mod config;
pub mod framer;
pub mod source;
pub mod state;

pub use config::{ReadErrorPolicy, SerialConfig, DEFAULT_BAUD_RATE};
pub use framer::LineFramer;
pub use source::{open, FramedSource, LineSource, ReadOutcome, SerialLineSource};
pub use state::{LinkState, LinkStatus};
