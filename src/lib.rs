//! Chest relay library.
//!
//! A WebSocket relay between game clients and the chest, lobby and game
//! contracts. Reads are answered from `eth_call`; writes are signed by one
//! operator account and answered once mined.

pub mod blockchain;
pub mod config;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;

pub use config::schema::RelayConfig;
pub use gateway::Gateway;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
