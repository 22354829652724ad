//! HTTP listener
//!
//! Binds the socket up front so that bind failures surface before the relay
//! reports itself as serving, then runs axum until shutdown.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::server::config::ServerConfig;
use crate::server::routes::{build_router, AppState};

/// Bound HTTP server
pub struct RelayServer {
    listener: TcpListener,
    router: Router,
    local_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl RelayServer {
    /// Bind the listener and build the router
    pub async fn bind(config: &ServerConfig, mut state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(config.bind_addr)
            .await
            .map_err(|source| Error::Bind {
                addr: config.bind_addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        state.send_timeout = config.send_timeout;
        let shutdown = state.shutdown.clone();
        let router = build_router(state, config.cors_permissive);

        Ok(Self {
            listener,
            router,
            local_addr,
            shutdown,
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` resolves
    ///
    /// Open WebSocket sessions are closed when shutdown begins.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(addr = %self.local_addr, "HTTP server listening");

        let sessions = self.shutdown.clone();
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                sessions.cancel();
            })
            .await?;

        Ok(())
    }
}
