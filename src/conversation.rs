//! One open conversation: history, live updates and teardown.
//!
//! Opening fetches the full history first and only then subscribes to the
//! live feed. The feed delivers every inserted message row; rows outside the
//! conversation pair are dropped here before anything else happens to them.

use std::sync::Arc;

use chatcore::query::{Order, Select, pair_filter};
use chatcore::thread::{Admission, ConversationPair, Thread};
use chatcore::types::{Message, MessageRow, Profile};
use log::{debug, error, info, trace, warn};
use serde_json::Value;

use crate::client::Client;
use crate::composer::MESSAGES_TABLE;
use crate::error::ClientError;
use crate::realtime::{ChannelSpec, Subscription};

const HISTORY_COLUMNS: &str = "*,sender:sender_id(username)";

pub struct Conversation {
    client: Arc<Client>,
    contact: Profile,
    thread: Thread,
    subscription: Option<Subscription>,
}

impl Conversation {
    /// Opens the conversation between the signed-in user and `contact`.
    ///
    /// A failed history fetch leaves the thread empty and a failed subscribe
    /// leaves the conversation without live updates; both are logged and
    /// neither fails the call. Only a missing session is an error.
    pub async fn open(client: Arc<Client>, contact: Profile) -> Result<Self, ClientError> {
        let session = client.require_session().await?;
        let pair = ConversationPair::new(session.user.id.clone(), contact.id.clone());

        let mut conversation = Self {
            client,
            contact,
            thread: Thread::new(pair.clone()),
            subscription: None,
        };
        conversation.load_history().await;

        let spec = ChannelSpec::inserts(pair.topic(), MESSAGES_TABLE)
            .with_access_token(session.access_token.clone());
        match conversation.client.feed.subscribe(spec).await {
            Ok(subscription) => {
                debug!("Subscribed to {}", subscription.topic());
                conversation.subscription = Some(subscription);
            }
            Err(e) => warn!("Live updates unavailable for {}: {e:?}", pair.topic()),
        }

        info!(
            "Opened conversation with {} ({} messages)",
            conversation.contact.username,
            conversation.thread.len()
        );
        Ok(conversation)
    }

    async fn load_history(&mut self) {
        let query = Select::from(MESSAGES_TABLE)
            .columns(HISTORY_COLUMNS)
            .or(pair_filter(self.thread.pair()))
            .order("created_at", Order::Ascending);

        let rows: Vec<MessageRow> = match self.client.select(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("Error fetching messages with {}: {e}", self.contact.username);
                return;
            }
        };

        let mut history = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(message) = self.enrich(row).await {
                history.push(message);
            }
        }
        self.thread = Thread::from_history(self.thread.pair().clone(), history);
    }

    /// Attaches the sender's display name. Rows with no payload are dropped.
    async fn enrich(&self, row: MessageRow) -> Option<Message> {
        if !row.has_payload() {
            warn!("Discarding message {} with no content or media", row.id);
            return None;
        }
        let name = match row.embedded_sender_name() {
            Some(name) => {
                let name = name.to_string();
                self.client
                    .profile_cache
                    .insert(row.sender_id.clone(), name.clone());
                name
            }
            None => self.client.display_name(&row.sender_id).await,
        };
        Some(row.into_message(name))
    }

    pub fn contact(&self) -> &Profile {
        &self.contact
    }

    pub fn pair(&self) -> &ConversationPair {
        self.thread.pair()
    }

    pub fn messages(&self) -> &[Message] {
        self.thread.messages()
    }

    pub fn recent(&self, n: usize) -> &[Message] {
        self.thread.recent(n)
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Waits for the next raw row from the live feed. Cancel-safe, so it can
    /// sit in a `select!` next to other inputs. Returns `None` when the
    /// conversation is not live; a closed feed also makes it non-live.
    pub async fn recv_row(&mut self) -> Option<Value> {
        let subscription = self.subscription.as_mut()?;
        let row = subscription.recv().await;
        if row.is_none() {
            warn!("Live feed for {} closed", subscription.topic());
            self.subscription = None;
        }
        row
    }

    /// Offers a raw live row to the thread. Returns the message when it was
    /// inserted.
    pub async fn admit(&mut self, row: Value) -> Option<Message> {
        let row: MessageRow = match serde_json::from_value(row) {
            Ok(row) => row,
            Err(e) => {
                warn!("Ignoring undecodable message row: {e}");
                return None;
            }
        };
        if !self.thread.pair().matches(&row.sender_id, &row.receiver_id) {
            trace!("Dropping message {} from another conversation", row.id);
            return None;
        }
        if self.thread.contains(row.id) {
            return None;
        }

        let message = self.enrich(row).await?;
        match self.thread.insert(message.clone()) {
            Admission::Inserted(_) => Some(message),
            Admission::Duplicate | Admission::Foreign => None,
        }
    }

    /// Waits for the next message that belongs to this conversation.
    pub async fn next_update(&mut self) -> Option<Message> {
        loop {
            let row = self.recv_row().await?;
            if let Some(message) = self.admit(row).await {
                return Some(message);
            }
        }
    }

    /// Stops live updates. Dropping the conversation does the same.
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!("Unsubscribing from {}", subscription.topic());
        }
    }
}
