//! Gateway error types.

use alloy::primitives::Address;
use thiserror::Error;

use crate::blockchain::BlockchainError;

/// Why a client event failed. Every variant becomes `{success: false, error}`.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A capability the event needs was not configured at startup.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Arguments failed local validation; nothing was sent to the chain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Fallback auto-discovery found nothing to activate.
    #[error("No eligible request found for fallback activation for {0}")]
    NoEligibleRequest(Address),

    /// The contract refused fallback for this sequence number at submission time.
    #[error("Sequence number {0} is not eligible for fallback activation")]
    FallbackNotEligible(u64),

    /// A call returned data that does not match its ABI.
    #[error("Could not decode {call} result: {message}")]
    Decode { call: &'static str, message: String },

    #[error(transparent)]
    Chain(#[from] BlockchainError),
}

pub type RelayResult<T> = Result<T, RelayError>;
