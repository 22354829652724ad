//! Registry configuration

use crate::error::{Error, Result};

/// Default number of records retained for replay
pub const DEFAULT_MAX_RECORDS: usize = 50;

/// Default number of live records an observer may fall behind by
pub const DEFAULT_OBSERVER_QUEUE: usize = 256;

/// Configuration for the history buffer and observer fan-out
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of records kept in history
    pub max_records: usize,

    /// Per-observer queue slots beyond the join-time replay.
    /// An observer that falls further behind than this is dropped.
    pub observer_queue: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            observer_queue: DEFAULT_OBSERVER_QUEUE,
        }
    }
}

impl RegistryConfig {
    /// Set the history capacity
    pub fn max_records(mut self, max: usize) -> Self {
        self.max_records = max;
        self
    }

    /// Set the per-observer queue depth
    pub fn observer_queue(mut self, slots: usize) -> Self {
        self.observer_queue = slots;
        self
    }

    /// Reject values the registry cannot operate with
    pub fn validate(&self) -> Result<()> {
        if self.max_records == 0 {
            return Err(Error::Config("max_records must be at least 1".into()));
        }
        if self.observer_queue == 0 {
            return Err(Error::Config("observer_queue must be at least 1".into()));
        }
        Ok(())
    }
}
