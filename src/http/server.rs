//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router with the socket, health and status handlers
//! - Wire up the HTTP trace layer
//! - Serve until shutdown, then wait for sessions to drain

use axum::{
    extract::{State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ListenerConfig;
use crate::gateway::Gateway;
use crate::http::websocket;
use crate::lifecycle::Shutdown;
use crate::net::SessionTracker;

/// How long shutdown waits for open sessions to finish in-flight events
/// unless the caller sets a longer bound.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(130);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub sessions: SessionTracker,
    pub shutdown: Shutdown,
    pub max_frame_bytes: usize,
    pub chain_id: u64,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    state: AppState,
    drain_timeout: Duration,
}

impl RelayServer {
    pub fn new(gateway: Gateway, listener: &ListenerConfig, chain_id: u64, shutdown: Shutdown) -> Self {
        let state = AppState {
            gateway: Arc::new(gateway),
            sessions: SessionTracker::new(),
            shutdown,
            max_frame_bytes: listener.max_frame_bytes,
            chain_id,
        };
        let router = Self::build_router(state.clone());
        Self {
            router,
            state,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Bound on how long `run` waits for sessions after the listener stops.
    /// A pending write needs up to its confirmation timeout to answer.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .route("/status", get(status_handler))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    pub fn sessions(&self) -> SessionTracker {
        self.state.sessions.clone()
    }

    /// Serve on `listener` until the shutdown coordinator fires.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Relay server starting");

        let shutdown = self.state.shutdown.clone();
        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        let sessions = self.state.sessions;
        if !sessions.drain(self.drain_timeout).await {
            tracing::warn!(
                remaining = sessions.active_count(),
                "Sessions still open after drain timeout"
            );
        }

        tracing::info!("Relay server stopped");
        Ok(())
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limit = state.max_frame_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| websocket::run_session(socket, state))
}

async fn health_handler() -> impl IntoResponse {
    "ok"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub version: &'static str,
    pub chain_id: u64,
    pub operator: Option<String>,
    pub active_sessions: u64,
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    Json(StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        chain_id: state.chain_id,
        operator: state.gateway.operator().map(|a| a.to_checksum(None)),
        active_sessions: state.sessions.active_count(),
    })
}
