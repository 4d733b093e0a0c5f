//! Chest relay
//!
//! # Architecture Overview
//!
//! ```text
//!   game client                         chest-relay                                chain
//!  ─────────────┐   ┌──────────────────────────────────────────────────┐
//!   {event,id,  │   │  http::server ──▶ http::websocket (per session)  │
//!    data}  ────┼──▶│                       │ one task per frame       │
//!               │   │                       ▼                          │
//!               │   │  protocol::request ─▶ gateway ─▶ reads  ─────────┼──▶ eth_call
//!               │   │                        │      ─▶ writes ─────────┼──▶ estimate, sign,
//!               │   │                        ▼                         │    send, receipt
//!   <event>-    │◀──┼── single writer ◀── gateway::report              │
//!   result      │   │                                                  │
//!  ─────────────┘   │  config · observability · lifecycle · net        │
//!                   └──────────────────────────────────────────────────┘
//! ```

use chest_relay::blockchain::{ChainBackend, GasPolicy, OperatorSigner, RpcClient, TxSubmitter};
use chest_relay::config::load_config;
use chest_relay::lifecycle::signals::shutdown_on_signal;
use chest_relay::observability::{logging, metrics};
use chest_relay::{Gateway, RelayServer, Shutdown};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "chest-relay", version)]
#[command(about = "WebSocket relay for the chest, lobby and game contracts", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init_tracing(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "chest-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.blockchain.rpc_url,
        chain_id = config.blockchain.chain_id,
        chest = %config.contracts.chest_address,
        lobby = %config.contracts.lobby_address,
        game = %config.contracts.game_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let signer = OperatorSigner::from_env(config.blockchain.chain_id)?.map(Arc::new);
    if signer.is_none() {
        tracing::warn!(
            env_var = chest_relay::blockchain::signer::PRIVATE_KEY_ENV_VAR,
            "No operator key configured; write events will be rejected"
        );
    }

    let chain: Arc<dyn ChainBackend> = Arc::new(RpcClient::new(config.blockchain.clone()).await?);
    let submitter = signer.map(|signer| {
        TxSubmitter::new(Arc::clone(&chain), signer, GasPolicy::from(&config.blockchain))
    });
    let gateway = Gateway::from_config(chain, submitter, &config.contracts)?;

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let drain_timeout = Duration::from_secs(config.blockchain.confirmation_timeout_secs + 10);
    let server = RelayServer::new(gateway, &config.listener, config.blockchain.chain_id, shutdown)
        .with_drain_timeout(drain_timeout);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
