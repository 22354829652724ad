//! Record registry for fan-out to viewers
//!
//! The registry retains recent records and routes each new record from the
//! ingestion loop to every registered observer.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<Broadcaster>
//!                  ┌──────────────────────────┐
//!                  │ Mutex<Inner {            │
//!                  │   history: History,      │
//!                  │   observers: HashMap<Id, │
//!                  │     mpsc::Sender>,       │
//!                  │ }>                       │
//!                  └────────────┬─────────────┘
//!                               │
//!         ┌─────────────────────┼─────────────────────┐
//!         │                     │                     │
//!         ▼                     ▼                     ▼
//!   [Ingest loop]          [Observer]            [Observer]
//!   publish(record)        sub.recv()            sub.recv()
//!         │                     │                     │
//!         └──► append + try_send ──► WebSocket ──► browser
//! ```
//!
//! # Late joiners
//!
//! `register` snapshots the history into the new observer's queue while
//! holding the same lock `publish` takes, so the observer sees every record
//! exactly once regardless of timing.

pub mod broadcaster;
pub mod config;
pub mod history;
pub mod subscription;

pub use broadcaster::{Broadcaster, Delivery};
pub use config::RegistryConfig;
pub use history::History;
pub use subscription::{ObserverId, Subscription};
