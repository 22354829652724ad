//! HTTP and WebSocket surface
//!
//! | Route          | Method     | Body                                   |
//! |----------------|------------|----------------------------------------|
//! | `/`            | GET        | viewer page                            |
//! | `/api/data`    | GET        | history as a JSON array, oldest first  |
//! | `/api/clear`   | GET, POST  | `{"status":"cleared"}`                 |
//! | `/api/stats`   | GET        | counters, observers, history, link     |
//! | `/health`      | GET        | 200 when the device link is connected  |
//! | `/ws`          | GET        | WebSocket stream of `new_data` events  |

pub mod config;
pub mod listener;
pub mod routes;
pub mod ws;

pub use config::{ServerConfig, DEFAULT_BIND_ADDR};
pub use listener::RelayServer;
pub use routes::{build_router, AppState, StatsResponse};
