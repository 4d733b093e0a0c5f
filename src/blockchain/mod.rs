//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway operation
//!     → contracts.rs (ABI encode the call)
//!     → client.rs (eth_call over primary + failover providers)      reads
//!     → transaction.rs (estimate, price, sign, broadcast, confirm)   writes
//!         → signer.rs (operator key, write lock)
//!     → normalize.rs (chain values to client JSON)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod backend;
pub mod client;
pub mod contracts;
pub mod normalize;
pub mod signer;
pub mod transaction;
pub mod types;

pub use backend::ChainBackend;
pub use client::RpcClient;
pub use normalize::Normalize;
pub use signer::OperatorSigner;
pub use transaction::{GasPolicy, TxSubmitter, WriteRequest};
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainReceipt};
