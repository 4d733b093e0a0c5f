//! Socket wire protocol.
//!
//! # Data Flow
//! ```text
//! text frame
//!     → request.rs (envelope, then typed RelayRequest)
//!     → gateway
//!     → response.rs (<event>-result envelope)
//!     → text frame
//! ```

pub mod request;
pub mod response;

pub use request::{Envelope, RelayRequest, EVENT_NAMES};
pub use response::RelayResponse;
