//! Per-socket session loop.
//!
//! Each text frame is handled in its own task so a slow chain call never
//! holds up other events on the same socket. Replies go through one channel
//! to a single writer task, so frames are never interleaved. Every frame gets
//! exactly one reply, including when its handler panics or the server starts
//! shutting down while it is still running.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{FutureExt, SinkExt, StreamExt};
use serde_json::Map;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::gateway::Gateway;
use crate::http::server::AppState;
use crate::net::SessionId;
use crate::protocol::{Envelope, RelayResponse};

/// Replies queued per socket before handler tasks wait on the writer.
const OUTBOUND_BUFFER: usize = 256;

/// Close code 1001: the server is going away.
const CLOSE_GOING_AWAY: u16 = 1001;

pub async fn run_session(socket: WebSocket, state: AppState) {
    let guard = state.sessions.track();
    let session_id = guard.id();
    tracing::info!(session_id = %session_id, "Session opened");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);

    let writer = tokio::spawn(async move {
        // The session counts as open until its last reply is written.
        let _guard = guard;
        while let Some(message) = rx.recv().await {
            if let Err(e) = sink.send(message).await {
                tracing::debug!(session_id = %session_id, error = %e, "Socket write failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let shutdown = state.shutdown.clone();
    let shutdown_signal = shutdown.wait();
    tokio::pin!(shutdown_signal);
    let mut in_flight = JoinSet::new();
    let mut closing = false;

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    dispatch(&mut in_flight, text.as_str().to_owned(), Arc::clone(&state.gateway), tx.clone(), session_id);
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => dispatch(&mut in_flight, text, Arc::clone(&state.gateway), tx.clone(), session_id),
                    Err(e) => {
                        let reply = RelayResponse::malformed(e);
                        let _ = tx.send(Message::Text(reply.to_text().into())).await;
                    }
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(session_id = %session_id, error = %e, "Socket read failed");
                    break;
                }
            },
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            _ = &mut shutdown_signal => {
                closing = true;
                break;
            }
        }
    }

    // Events already accepted still get their reply before the socket closes.
    if !in_flight.is_empty() {
        tracing::debug!(session_id = %session_id, pending = in_flight.len(), "Waiting for in-flight events");
    }
    while in_flight.join_next().await.is_some() {}

    if closing {
        let _ = tx
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_GOING_AWAY,
                reason: "server shutting down".into(),
            })))
            .await;
    }

    drop(tx);
    let _ = writer.await;
    tracing::info!(session_id = %session_id, "Session ended");
}

fn dispatch(
    in_flight: &mut JoinSet<()>,
    text: String,
    gateway: Arc<Gateway>,
    tx: mpsc::Sender<Message>,
    session_id: SessionId,
) {
    in_flight.spawn(async move {
        let reply = match AssertUnwindSafe(gateway.respond(&text)).catch_unwind().await {
            Ok(reply) => reply,
            Err(_) => {
                tracing::error!(session_id = %session_id, "Event handler panicked");
                match Envelope::decode(&text) {
                    Ok(envelope) => RelayResponse::failure(&envelope.event, envelope.id, "Internal error", Map::new()),
                    Err(e) => RelayResponse::malformed(e),
                }
            }
        };

        if tx.send(Message::Text(reply.to_text().into())).await.is_err() {
            tracing::debug!(session_id = %session_id, event = %reply.event, "Session closed before reply");
        }
    });
}
