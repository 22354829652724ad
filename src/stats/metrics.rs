//! Statistics for the relay

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::registry::Delivery;

/// Relay-wide counters, updated by the ingestion loop
#[derive(Debug)]
pub struct RelayStats {
    started_at: Instant,
    lines_read: AtomicU64,
    records_published: AtomicU64,
    lines_rejected: AtomicU64,
    lines_discarded: AtomicU64,
    read_errors: AtomicU64,
    observers_dropped: AtomicU64,
}

impl RelayStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            lines_read: AtomicU64::new(0),
            records_published: AtomicU64::new(0),
            lines_rejected: AtomicU64::new(0),
            lines_discarded: AtomicU64::new(0),
            read_errors: AtomicU64::new(0),
            observers_dropped: AtomicU64::new(0),
        }
    }

    pub fn record_line(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.lines_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Count overlong lines the framer dropped
    pub fn record_discarded(&self, lines: u64) {
        self.lines_discarded.fetch_add(lines, Ordering::Relaxed);
    }

    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a published record and any observers its delivery dropped
    pub fn record_published(&self, delivery: &Delivery) {
        self.records_published.fetch_add(1, Ordering::Relaxed);
        let dropped = (delivery.lagging + delivery.disconnected) as u64;
        if dropped > 0 {
            self.observers_dropped.fetch_add(dropped, Ordering::Relaxed);
        }
    }

    /// Time since the tracker was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines_read: self.lines_read.load(Ordering::Relaxed),
            records_published: self.records_published.load(Ordering::Relaxed),
            lines_rejected: self.lines_rejected.load(Ordering::Relaxed),
            lines_discarded: self.lines_discarded.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            observers_dropped: self.observers_dropped.load(Ordering::Relaxed),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable copy of `RelayStats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Non-empty lines read from the device
    pub lines_read: u64,
    /// Lines that parsed into a record
    pub records_published: u64,
    /// Lines that did not match the expected format
    pub lines_rejected: u64,
    /// Overlong lines dropped before they could be parsed
    pub lines_discarded: u64,
    /// Failed reads
    pub read_errors: u64,
    /// Observers removed because they lagged or disconnected
    pub observers_dropped: u64,
    /// Seconds since startup
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_stats_new() {
        let stats = RelayStats::new().snapshot();
        assert_eq!(stats.lines_read, 0);
        assert_eq!(stats.records_published, 0);
        assert_eq!(stats.lines_rejected, 0);
        assert_eq!(stats.lines_discarded, 0);
        assert_eq!(stats.read_errors, 0);
        assert_eq!(stats.observers_dropped, 0);
    }

    #[test]
    fn test_relay_stats_counts() {
        let stats = RelayStats::new();

        stats.record_line();
        stats.record_line();
        stats.record_rejected();
        stats.record_read_error();
        stats.record_discarded(2);
        stats.record_published(&Delivery {
            delivered: 3,
            lagging: 1,
            disconnected: 1,
        });

        let snap = stats.snapshot();
        assert_eq!(snap.lines_read, 2);
        assert_eq!(snap.lines_rejected, 1);
        assert_eq!(snap.read_errors, 1);
        assert_eq!(snap.lines_discarded, 2);
        assert_eq!(snap.records_published, 1);
        assert_eq!(snap.observers_dropped, 2);
    }
}
