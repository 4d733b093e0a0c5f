use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the chest relay", long_about = None)]
struct Cli {
    /// Relay base URL
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show relay version, chain and operator
    Status,
    /// Send one event and print its result
    Send {
        /// Event name, e.g. get-entropy-fee
        event: String,
        /// JSON object passed as the event data
        #[arg(short, long)]
        data: Option<String>,
        /// Seconds to wait for the result
        #[arg(short, long, default_value_t = 180)]
        timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Status => {
            let res = reqwest::get(format!("{}/status", base)).await?;
            if !res.status().is_success() {
                eprintln!("Error: relay returned status {}", res.status());
                std::process::exit(1);
            }
            let status: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::Send { event, data, timeout } => {
            let data: Value = match data {
                Some(raw) => serde_json::from_str(&raw)?,
                None => json!({}),
            };
            let result = send_event(&ws_url(base), &event, data, Duration::from_secs(timeout)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result["success"] != Value::Bool(true) {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn ws_url(base: &str) -> String {
    let socket_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };
    format!("{}/ws", socket_base)
}

/// Send one event and wait for the reply carrying the same id.
async fn send_event(url: &str, event: &str, data: Value, limit: Duration) -> Result<Value, Box<dyn std::error::Error>> {
    let (mut socket, _) = connect_async(url).await?;
    let id = uuid::Uuid::new_v4().to_string();
    let frame = json!({ "event": event, "id": id, "data": data });
    socket.send(Message::Text(frame.to_string().into())).await?;

    let reply = tokio::time::timeout(limit, async {
        while let Some(message) = socket.next().await {
            if let Message::Text(text) = message? {
                let reply: Value = serde_json::from_str(text.as_str())?;
                if reply["id"] == Value::String(id.clone()) || reply["event"] == "error" {
                    return Ok::<Value, Box<dyn std::error::Error>>(reply);
                }
            }
        }
        Err("connection closed before a result arrived".into())
    })
    .await
    .map_err(|_| format!("no result within {} seconds", limit.as_secs()))??;

    let _ = socket.close(None).await;
    Ok(reply["data"].clone())
}
