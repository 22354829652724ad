//! Serial telemetry relay
//!
//! Reads `ID: <n> | Time: <t> seconds` lines from a serial device, keeps a
//! bounded history of parsed records, and pushes every new record to all
//! connected web viewers. Viewers that join late first receive the history,
//! oldest first, then live records, with nothing missed or repeated.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use serial_relay::ingest::IngestPipeline;
//! use serial_relay::registry::Broadcaster;
//! use serial_relay::serial::{self, LinkStatus, SerialConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> serial_relay::Result<()> {
//! let link = LinkStatus::new();
//! let source = serial::open(&SerialConfig::new("/dev/ttyACM0"), &link)?;
//! let broadcaster = Arc::new(Broadcaster::new());
//!
//! let mut viewer = broadcaster.register();
//! let handle = IngestPipeline::new(source, Arc::clone(&broadcaster))
//!     .with_link(link)
//!     .spawn(CancellationToken::new());
//!
//! while let Some(record) = viewer.recv().await {
//!     println!("#{} {:.3}s", record.id, record.time);
//! }
//! handle.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ingest;
pub mod record;
pub mod registry;
pub mod serial;
pub mod server;
pub mod stats;

pub use config::RelayConfig;
pub use error::{Error, Result};
pub use ingest::{IngestPipeline, PipelineExit, PipelineHandle};
pub use record::{parse_line, Reading, Record};
pub use registry::{Broadcaster, RegistryConfig, Subscription};
pub use server::{AppState, RelayServer, ServerConfig};
