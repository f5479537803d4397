//! Realtime channel frames.
//!
//! The change feed speaks Phoenix channels over a websocket: every frame is a
//! JSON object `{topic, event, payload, ref}`. A subscriber joins a topic with
//! a `postgres_changes` filter, keeps the socket alive with heartbeats on the
//! `phoenix` topic, and leaves the topic on teardown.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::feed::ChannelSpec;

pub const EVENT_JOIN: &str = "phx_join";
pub const EVENT_LEAVE: &str = "phx_leave";
pub const EVENT_REPLY: &str = "phx_reply";
pub const EVENT_ERROR: &str = "phx_error";
pub const EVENT_CLOSE: &str = "phx_close";
pub const EVENT_HEARTBEAT: &str = "heartbeat";
pub const EVENT_POSTGRES_CHANGES: &str = "postgres_changes";

pub const HEARTBEAT_TOPIC: &str = "phoenix";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
}

impl Frame {
    pub fn join(spec: &ChannelSpec, reference: u64) -> Self {
        let mut payload = json!({
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": "INSERT",
                    "schema": spec.schema,
                    "table": spec.table,
                }],
            }
        });
        if let Some(token) = &spec.access_token {
            payload["access_token"] = Value::String(token.clone());
        }
        Self {
            topic: spec.topic.clone(),
            event: EVENT_JOIN.to_string(),
            payload,
            reference: Some(reference.to_string()),
        }
    }

    pub fn leave(topic: &str, reference: u64) -> Self {
        Self {
            topic: topic.to_string(),
            event: EVENT_LEAVE.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn heartbeat(reference: u64) -> Self {
        Self {
            topic: HEARTBEAT_TOPIC.to_string(),
            event: EVENT_HEARTBEAT.to_string(),
            payload: json!({}),
            reference: Some(reference.to_string()),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The inserted row, if this frame reports an INSERT on `table`.
    pub fn inserted_record(&self, table: &str) -> Option<&Value> {
        if self.event != EVENT_POSTGRES_CHANGES {
            return None;
        }
        let data = self.payload.get("data")?;
        let kind = data.get("type").and_then(Value::as_str)?;
        let from_table = data.get("table").and_then(Value::as_str)?;
        if kind != "INSERT" || from_table != table {
            return None;
        }
        data.get("record")
    }

    /// The rejection reason if this frame is an error reply.
    pub fn reply_error(&self) -> Option<String> {
        if self.event == EVENT_ERROR {
            return Some("channel error".to_string());
        }
        if self.event != EVENT_REPLY {
            return None;
        }
        let status = self.payload.get("status").and_then(Value::as_str)?;
        if status == "ok" {
            return None;
        }
        let reason = self
            .payload
            .get("response")
            .and_then(|r| r.get("reason"))
            .and_then(Value::as_str)
            .unwrap_or(status);
        Some(reason.to_string())
    }

    /// True for the server's reply to the frame sent with `reference`.
    pub fn is_reply_to(&self, reference: u64) -> bool {
        self.event == EVENT_REPLY && self.reference.as_deref() == Some(reference.to_string().as_str())
    }

    pub fn is_close(&self) -> bool {
        self.event == EVENT_CLOSE
    }
}
