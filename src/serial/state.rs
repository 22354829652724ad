//! Serial link state machine
//!
//! `Disconnected → Connecting → Connected → Disconnected`. The ingestion loop
//! is the only writer; anything else may read it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

/// Link lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    /// No device handle is held
    Disconnected,
    /// Opening the device
    Connecting,
    /// Device open, lines streaming
    Connected,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        };
        f.write_str(name)
    }
}

/// Shared link state
#[derive(Debug, Clone)]
pub struct LinkStatus {
    state: Arc<RwLock<LinkState>>,
}

impl LinkStatus {
    /// Start in `Disconnected`
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(LinkState::Disconnected)),
        }
    }

    /// Current state
    pub fn get(&self) -> LinkState {
        *self.state.read()
    }

    /// Transition to `state`
    pub(crate) fn set(&self, state: LinkState) {
        let previous = std::mem::replace(&mut *self.state.write(), state);
        if previous != state {
            tracing::debug!(from = %previous, to = %state, "Link state changed");
        }
    }
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self::new()
    }
}
