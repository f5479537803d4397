use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use tokio::sync::mpsc;

/// What a live subscription listens to: inserts on one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub topic: String,
    pub schema: String,
    pub table: String,
    pub access_token: Option<String>,
}

impl ChannelSpec {
    pub fn inserts(topic: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            schema: "public".to_string(),
            table: table.into(),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

/// A live subscription. Rows arrive through [`Subscription::recv`]; dropping
/// the handle tears the subscription down.
pub struct Subscription {
    topic: String,
    rows: mpsc::Receiver<Value>,
    on_drop: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        topic: impl Into<String>,
        rows: mpsc::Receiver<Value>,
        on_drop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            topic: topic.into(),
            rows,
            on_drop: Some(Box::new(on_drop)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next inserted row. `None` once the feed has closed.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rows.recv().await
    }

    /// Returns a row if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Value> {
        self.rows.try_recv().ok()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rows.close();
        if let Some(on_drop) = self.on_drop.take() {
            on_drop();
        }
    }
}

/// A push channel delivering newly inserted rows to every active subscriber.
/// Subscribers receive all inserts on the table and filter them themselves.
#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn subscribe(&self, spec: ChannelSpec) -> Result<Subscription>;
}
