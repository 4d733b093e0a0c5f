//! Uniform error capture and response shaping for every event.

use serde_json::{Map, Value};
use std::future::Future;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::gateway::error::RelayResult;
use crate::observability::metrics;
use crate::protocol::request::known_event;
use crate::protocol::RelayResponse;

/// Run one event handler and turn its outcome into the single reply.
///
/// `context` is echoed into the reply only on failure.
pub async fn execute_and_report<F>(
    event: &str,
    id: Option<Value>,
    context: Map<String, Value>,
    operation: F,
) -> RelayResponse
where
    F: Future<Output = RelayResult<Value>>,
{
    let started = Instant::now();
    let label = known_event(event).unwrap_or("unknown");
    let span = tracing::info_span!("event", event = label, trace_id = %Uuid::new_v4());

    async move {
        match operation.await {
            Ok(payload) => {
                metrics::record_event(label, true, started);
                tracing::info!(elapsed_ms = started.elapsed().as_millis() as u64, "Event handled");
                RelayResponse::success(event, id, payload)
            }
            Err(e) => {
                metrics::record_event(label, false, started);
                tracing::warn!(error = %e, elapsed_ms = started.elapsed().as_millis() as u64, "Event failed");
                RelayResponse::failure(event, id, &e, context)
            }
        }
    }
    .instrument(span)
    .await
}
