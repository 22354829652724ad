//! Observer handles
//!
//! A `Subscription` is the receiving end of one observer's queue. It yields
//! the join-time replay first and then every live record, in publish order.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;

use crate::record::Record;

/// Unique identifier for a registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Allocate the next id from a counter
    pub(super) fn next(counter: &AtomicU64) -> Self {
        Self(counter.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Receiving side of a registered observer
///
/// Dropping the subscription closes its queue; the broadcaster notices on the
/// next publish and forgets the observer.
#[derive(Debug)]
pub struct Subscription {
    id: ObserverId,
    rx: mpsc::Receiver<Record>,
    replayed: usize,
}

impl Subscription {
    pub(super) fn new(id: ObserverId, rx: mpsc::Receiver<Record>, replayed: usize) -> Self {
        Self { id, rx, replayed }
    }

    /// Id to pass to `Broadcaster::deregister`
    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Number of history records queued at join time
    pub fn replayed(&self) -> usize {
        self.replayed
    }

    /// Wait for the next record
    ///
    /// Returns `None` once the observer has been deregistered (explicitly or
    /// for falling too far behind) and its queue is drained.
    pub async fn recv(&mut self) -> Option<Record> {
        self.rx.recv().await
    }

    /// Drain every record currently queued
    pub fn drain(&mut self) -> Vec<Record> {
        let mut records = Vec::new();
        while let Ok(record) = self.rx.try_recv() {
            records.push(record);
        }
        records
    }
}
