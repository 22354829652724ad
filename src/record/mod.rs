//! Telemetry records
//!
//! This module provides:
//! - The `Record` type relayed to viewers
//! - Line parsing for the device's `ID: <n> | Time: <t> seconds` format
//! - The push event envelope sent over the live channel

pub mod entry;
pub mod parser;

pub use entry::{PushEvent, Reading, Record, TIMESTAMP_FORMAT};
pub use parser::parse_line;
