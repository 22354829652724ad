//! HTTP routes
//!
//! Thin handlers over the broadcaster: the page, the history snapshot, clear,
//! stats, health, and the WebSocket push channel.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::record::Record;
use crate::registry::Broadcaster;
use crate::serial::{LinkState, LinkStatus};
use crate::stats::{RelayStats, StatsSnapshot};

use super::ws;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// Shared state passed to handlers
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
    pub stats: Arc<RelayStats>,
    pub link: LinkStatus,
    /// Cancelled when the server shuts down; ends open WebSocket sessions
    pub shutdown: CancellationToken,
    pub send_timeout: Duration,
}

impl AppState {
    pub fn new(broadcaster: Arc<Broadcaster>, stats: Arc<RelayStats>, link: LinkStatus) -> Self {
        Self {
            broadcaster,
            stats,
            link,
            shutdown: CancellationToken::new(),
            send_timeout: Duration::from_secs(10),
        }
    }
}

/// Response body for `/api/stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    pub observers: usize,
    pub history_len: usize,
    pub history_capacity: usize,
    pub link: LinkState,
}

/// Build the router with all routes
pub fn build_router(state: AppState, cors_permissive: bool) -> Router {
    let router = Router::new()
        .route("/", get(index_handler))
        .route("/api/data", get(data_handler))
        .route("/api/clear", get(clear_handler).post(clear_handler))
        .route("/api/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// All retained records, oldest first
async fn data_handler(State(state): State<AppState>) -> Json<Vec<Record>> {
    Json(state.broadcaster.snapshot())
}

async fn clear_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.broadcaster.clear();
    Json(serde_json::json!({ "status": "cleared" }))
}

async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        counters: state.stats.snapshot(),
        observers: state.broadcaster.observer_count(),
        history_len: state.broadcaster.history_len(),
        history_capacity: state.broadcaster.config().max_records,
        link: state.link.get(),
    })
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let link = state.link.get();
    let (status, label) = if link == LinkState::Connected {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (status, Json(serde_json::json!({ "status": label, "link": link })))
}
