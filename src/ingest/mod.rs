//! Ingestion from the device into the registry
//!
//! ```text
//!  serial port ──► LineFramer ──► parse_line ──► Broadcaster::publish
//!                 (LineSource)                    (history + fan-out)
//! ```

pub mod pipeline;

pub use pipeline::{IngestPipeline, PipelineExit, PipelineHandle};
