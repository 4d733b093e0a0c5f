//! Outbound frames.

use serde_json::{json, Map, Value};

/// Reply to exactly one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    /// `<event>-result`, or `error` for frames that could not be read.
    pub event: String,
    /// Correlation id copied from the request.
    pub id: Option<Value>,
    /// Always an object with a boolean `success`.
    pub data: Value,
}

impl RelayResponse {
    /// Successful result. Fields of an object payload are merged into `data`.
    pub fn success(event: &str, id: Option<Value>, payload: Value) -> Self {
        let mut data = match payload {
            Value::Object(fields) => fields,
            Value::Null => Map::new(),
            other => {
                let mut fields = Map::new();
                fields.insert("result".into(), other);
                fields
            }
        };
        data.insert("success".into(), Value::Bool(true));
        Self {
            event: result_event(event),
            id,
            data: Value::Object(data),
        }
    }

    /// Failed result. `context` fields are echoed beside the error message.
    pub fn failure(event: &str, id: Option<Value>, error: impl std::fmt::Display, context: Map<String, Value>) -> Self {
        let mut data = context;
        data.insert("success".into(), Value::Bool(false));
        data.insert("error".into(), Value::String(error.to_string()));
        Self {
            event: result_event(event),
            id,
            data: Value::Object(data),
        }
    }

    /// Reply to a frame that had no readable event name.
    pub fn malformed(error: impl std::fmt::Display) -> Self {
        Self {
            event: "error".into(),
            id: None,
            data: json!({
                "success": false,
                "error": format!("Malformed frame: {}", error),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.data.get("success").and_then(Value::as_bool).unwrap_or(false)
    }

    /// Serialize to a text frame.
    pub fn to_text(&self) -> String {
        let mut frame = Map::new();
        frame.insert("event".into(), Value::String(self.event.clone()));
        if let Some(id) = &self.id {
            frame.insert("id".into(), id.clone());
        }
        frame.insert("data".into(), self.data.clone());
        Value::Object(frame).to_string()
    }
}

fn result_event(event: &str) -> String {
    format!("{}-result", event)
}
