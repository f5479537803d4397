use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use serde_json::Value;
use tokio::sync::mpsc;

use super::{CHANNEL_CAPACITY, ChangeFeed, ChannelSpec, Subscription};

struct Subscriber {
    topic: String,
    table: String,
    rows: mpsc::Sender<Value>,
}

/// In-process change feed.
///
/// Every published row is delivered to every active subscriber of its table,
/// exactly like the hosted feed; subscribers filter for themselves.
#[derive(Clone, Default)]
pub struct LocalFeed {
    subscribers: Arc<DashMap<u64, Subscriber>>,
    next_id: Arc<AtomicU64>,
}

impl LocalFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `row` to all subscribers of `table`. Returns how many received it.
    pub fn publish(&self, table: &str, row: Value) -> usize {
        let mut delivered = 0;
        for entry in self.subscribers.iter() {
            let subscriber = entry.value();
            if subscriber.table != table {
                continue;
            }
            match subscriber.rows.try_send(row.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Dropping row for {}: {e}", subscriber.topic),
            }
        }
        delivered
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.len()
    }

    pub fn active_topics(&self) -> Vec<String> {
        self.subscribers
            .iter()
            .map(|entry| entry.value().topic.clone())
            .collect()
    }
}

#[async_trait]
impl ChangeFeed for LocalFeed {
    async fn subscribe(&self, spec: ChannelSpec) -> anyhow::Result<Subscription> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.subscribers.insert(
            id,
            Subscriber {
                topic: spec.topic.clone(),
                table: spec.table.clone(),
                rows: tx,
            },
        );
        debug!("Subscribed {} (#{id})", spec.topic);

        let subscribers = self.subscribers.clone();
        Ok(Subscription::new(spec.topic, rx, move || {
            subscribers.remove(&id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn rows_reach_every_subscriber_of_the_table() {
        let feed = LocalFeed::new();
        let mut first = feed
            .subscribe(ChannelSpec::inserts("t1", "messages"))
            .await
            .expect("subscribe");
        let mut second = feed
            .subscribe(ChannelSpec::inserts("t2", "messages"))
            .await
            .expect("subscribe");
        let _other = feed
            .subscribe(ChannelSpec::inserts("t3", "profiles"))
            .await
            .expect("subscribe");

        assert_eq!(feed.publish("messages", json!({"id": 1})), 2);
        assert_eq!(first.recv().await, Some(json!({"id": 1})));
        assert_eq!(second.recv().await, Some(json!({"id": 1})));
    }

    #[tokio::test]
    async fn dropping_a_subscription_unregisters_it() {
        let feed = LocalFeed::new();
        let sub = feed
            .subscribe(ChannelSpec::inserts("t1", "messages"))
            .await
            .expect("subscribe");
        assert_eq!(feed.active_subscriptions(), 1);
        assert_eq!(feed.active_topics(), vec!["t1".to_string()]);

        drop(sub);
        assert_eq!(feed.active_subscriptions(), 0);
        assert_eq!(feed.publish("messages", json!({"id": 1})), 0);
    }
}
