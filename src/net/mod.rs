//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Upgraded WebSocket
//!     → session.rs (id, active-session accounting)
//!     → Hand off to the session loop in http::websocket
//! ```

pub mod session;

pub use session::{SessionGuard, SessionId, SessionTracker};
