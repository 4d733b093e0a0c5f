//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.
//! The operator private key is deliberately absent: it is only ever read
//! from the environment (see [`crate::blockchain::signer`]).

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, session limits).
    pub listener: ListenerConfig,

    /// Chain connectivity and gas policy.
    pub blockchain: BlockchainConfig,

    /// Fixed contract addresses the relay talks to.
    pub contracts: ContractsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Maximum size of a single inbound frame in bytes.
    pub max_frame_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            max_frame_bytes: 64 * 1024,
        }
    }
}

/// Blockchain integration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, used for reads only.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 84532 for Base Sepolia, 31337 for local Anvil).
    pub chain_id: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// How long to wait for a submitted transaction to be mined.
    pub confirmation_timeout_secs: u64,

    /// Gas price multiplier (1.0 = network price, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            chain_id: 84532,
            rpc_timeout_secs: 10,
            confirmation_timeout_secs: 120,
            gas_price_multiplier: 1.0,
            max_gas_price_gwei: 500,
        }
    }
}

/// Addresses of the three external contracts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractsConfig {
    /// Chest opening / randomness contract.
    pub chest_address: String,

    /// Lobby / staking contract.
    pub lobby_address: String,

    /// Auxiliary game contract (random numbers, kills, leaderboards).
    pub game_address: String,

    /// Fixed value sent with `requestChestOpening`, in wei. `"entropy-fee"`
    /// reads the current fee from the chest contract on every request.
    pub chest_opening_value_wei: Option<String>,
}

/// `chest_opening_value_wei` setting that selects the live entropy fee.
pub const ENTROPY_FEE_VALUE: &str = "entropy-fee";

impl ContractsConfig {
    /// The fixed chest opening value, or `None` to pay the entropy fee.
    pub fn chest_opening_value(&self) -> Result<Option<U256>, String> {
        let Some(raw) = self.chest_opening_value_wei.as_deref() else {
            return Ok(None);
        };
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case(ENTROPY_FEE_VALUE) {
            return Ok(None);
        }
        if raw.is_empty() {
            return Err(format!("must be a decimal wei amount or \"{}\"", ENTROPY_FEE_VALUE));
        }
        raw.parse::<U256>()
            .map(Some)
            .map_err(|_| format!("'{}' is not a decimal wei amount", raw))
    }
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            chest_address: "0xB4Dd7437486D6615579f950602329B2073E4225b".to_string(),
            lobby_address: "0x8054056D3c1341bA27A8127c39AE0956d1794CF1".to_string(),
            game_address: String::new(),
            chest_opening_value_wei: Some("15000000000001".to_string()),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
