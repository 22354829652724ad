//! Broadcaster implementation
//!
//! Owns the record history and the set of registered observers. Both live
//! behind one mutex so that joining (replay + registration) and publishing
//! (append + fan-out) are totally ordered: a late joiner receives every
//! record exactly once, whether it arrived before or after the join.
//!
//! Delivery never blocks. Each observer has a bounded queue sized to hold its
//! replay plus `observer_queue` live records. An observer whose queue is full
//! is dropped rather than allowed to stall the ingestion loop; it sees the end
//! of its stream and can reconnect for a fresh replay.

use std::collections::HashMap;
use std::sync::atomic::AtomicU64;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::record::Record;

use super::config::RegistryConfig;
use super::history::History;
use super::subscription::{ObserverId, Subscription};

struct Inner {
    history: History,
    observers: HashMap<ObserverId, mpsc::Sender<Record>>,
}

/// Outcome of a single publish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Observers the record was queued for
    pub delivered: usize,
    /// Observers dropped because their queue was full
    pub lagging: usize,
    /// Observers forgotten because their subscription was dropped
    pub disconnected: usize,
}

/// Fan-out hub for records
pub struct Broadcaster {
    inner: Mutex<Inner>,
    config: RegistryConfig,
    next_observer_id: AtomicU64,
}

impl Broadcaster {
    /// Create a broadcaster with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a broadcaster with custom configuration
    ///
    /// Zero sizes are raised to 1; use `RegistryConfig::validate` to reject
    /// them up front.
    pub fn with_config(config: RegistryConfig) -> Self {
        let config = RegistryConfig {
            max_records: config.max_records.max(1),
            observer_queue: config.observer_queue.max(1),
        };

        Self {
            inner: Mutex::new(Inner {
                history: History::with_capacity(config.max_records),
                observers: HashMap::new(),
            }),
            config,
            next_observer_id: AtomicU64::new(1),
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Append a record to history and queue it for every observer
    pub fn publish(&self, record: Record) -> Delivery {
        let mut inner = self.inner.lock();
        inner.history.append(record);

        let mut delivery = Delivery::default();
        let mut dead = Vec::new();

        for (id, tx) in inner.observers.iter() {
            match tx.try_send(record) {
                Ok(()) => delivery.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        observer = %id,
                        queue = tx.max_capacity(),
                        "Observer queue full, dropping observer"
                    );
                    delivery.lagging += 1;
                    dead.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(observer = %id, "Observer gone, removing");
                    delivery.disconnected += 1;
                    dead.push(*id);
                }
            }
        }

        for id in dead {
            inner.observers.remove(&id);
        }

        delivery
    }

    /// Register an observer
    ///
    /// The returned subscription already holds the current history, oldest
    /// first. Records published afterwards follow it in order.
    pub fn register(&self) -> Subscription {
        let id = ObserverId::next(&self.next_observer_id);

        let mut inner = self.inner.lock();
        let replay = inner.history.snapshot();
        let (tx, rx) = mpsc::channel(replay.len() + self.config.observer_queue);

        for record in &replay {
            // Cannot fail: the queue was sized for the replay
            let _ = tx.try_send(*record);
        }

        inner.observers.insert(id, tx);
        let observers = inner.observers.len();
        drop(inner);

        tracing::info!(
            observer = %id,
            observers = observers,
            replay = replay.len(),
            "Observer registered"
        );

        Subscription::new(id, rx, replay.len())
    }

    /// Remove an observer; returns whether it was still registered
    ///
    /// Records already queued remain readable from the subscription.
    pub fn deregister(&self, id: ObserverId) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.observers.remove(&id).is_some();
        let observers = inner.observers.len();
        drop(inner);

        if removed {
            tracing::info!(observer = %id, observers = observers, "Observer deregistered");
        }

        removed
    }

    /// Current history, oldest first
    pub fn snapshot(&self) -> Vec<Record> {
        self.inner.lock().history.snapshot()
    }

    /// Empty the history
    ///
    /// Registered observers are not notified.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        let cleared = inner.history.len();
        inner.history.clear();
        drop(inner);

        tracing::info!(cleared = cleared, "History cleared");
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Number of records currently in history
    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
