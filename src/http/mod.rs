//! HTTP and WebSocket surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum router, trace layer)
//!         GET /ws     → websocket.rs (session loop)
//!         GET /health → liveness
//!         GET /status → version, chain, operator, sessions
//! ```

pub mod server;
pub mod websocket;

pub use server::{AppState, RelayServer};
