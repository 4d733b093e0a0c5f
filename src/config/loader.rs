//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::RelayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, message: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, message } => write!(f, "Invalid {}: {}", var, message),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply `RELAY_*`
/// environment overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => RelayConfig::default(),
    };

    let config = apply_env_overrides(config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto a parsed config.
///
/// `lookup` abstracts the environment so callers (and tests) can supply
/// their own source.
pub fn apply_env_overrides<F>(mut config: RelayConfig, lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("RELAY_RPC_URL") {
        config.blockchain.rpc_url = url;
    }
    if let Some(chain_id) = lookup("RELAY_CHAIN_ID") {
        config.blockchain.chain_id = chain_id.trim().parse().map_err(|e| ConfigError::Env {
            var: "RELAY_CHAIN_ID",
            message: format!("{}", e),
        })?;
    }
    if let Some(addr) = lookup("RELAY_BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(port) = lookup("RELAY_PORT") {
        let port: u16 = port.trim().parse().map_err(|e| ConfigError::Env {
            var: "RELAY_PORT",
            message: format!("{}", e),
        })?;
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{}:{}", host, port);
    }
    if let Some(addr) = lookup("RELAY_CHEST_ADDRESS") {
        config.contracts.chest_address = addr;
    }
    if let Some(addr) = lookup("RELAY_LOBBY_ADDRESS") {
        config.contracts.lobby_address = addr;
    }
    if let Some(addr) = lookup("RELAY_GAME_ADDRESS") {
        config.contracts.game_address = addr;
    }
    if let Some(value) = lookup("RELAY_CHEST_OPENING_VALUE_WEI") {
        config.contracts.chest_opening_value_wei = Some(value);
    }
    if let Some(level) = lookup("RELAY_LOG_LEVEL") {
        config.observability.log_level = level;
    }

    Ok(config)
}
