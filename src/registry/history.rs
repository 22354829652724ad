//! Bounded record history for late-joiner replay
//!
//! New viewers need everything observed so far before they start receiving
//! live records. The history keeps the most recent `capacity` records in
//! arrival order and silently evicts the oldest on overflow.

use std::collections::VecDeque;

use crate::record::Record;

/// Bounded FIFO buffer of recent records
#[derive(Debug)]
pub struct History {
    /// Maximum number of records retained
    capacity: usize,
    /// Retained records, oldest at the front
    records: VecDeque<Record>,
}

impl History {
    /// Create an empty history holding at most `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a record, evicting from the head until within capacity
    pub fn append(&mut self, record: Record) {
        self.records.push_back(record);

        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
    }

    /// Independent copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.iter().copied().collect()
    }

    /// Drop every retained record
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

}
