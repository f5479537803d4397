use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::user::UserId;

/// Embedded sender profile returned by a joined select.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SenderRef {
    pub username: String,
}

/// A message row exactly as the store or the live feed delivers it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    #[serde(default)]
    pub sender: Option<SenderRef>,
}

impl MessageRow {
    pub fn has_payload(&self) -> bool {
        self.content.is_some() || self.media_url.is_some()
    }

    /// Sender display name carried by a joined select, if any.
    pub fn embedded_sender_name(&self) -> Option<&str> {
        self.sender.as_ref().map(|s| s.username.as_str())
    }

    pub fn into_message(self, sender_name: impl Into<String>) -> Message {
        Message {
            id: self.id,
            created_at: self.created_at,
            content: self.content,
            media_url: self.media_url,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            sender_name: sender_name.into(),
        }
    }
}

/// A message enriched with its sender's display name, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub sender_name: String,
}

/// What a message carries, as seen by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    Text(&'a str),
    Media(&'a str),
    Empty,
}

impl Message {
    pub fn payload(&self) -> Payload<'_> {
        match (&self.content, &self.media_url) {
            (Some(text), _) => Payload::Text(text),
            (None, Some(url)) => Payload::Media(url),
            (None, None) => Payload::Empty,
        }
    }

    pub fn is_from(&self, user: &UserId) -> bool {
        &self.sender_id == user
    }
}

/// The single payload of an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Media(String),
}

/// An outgoing message. It always carries exactly one payload field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub body: MessageBody,
}

impl NewMessage {
    /// Builds a text message from raw input. Whitespace-only input yields `None`.
    pub fn text(sender_id: UserId, receiver_id: UserId, input: &str) -> Option<Self> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            sender_id,
            receiver_id,
            body: MessageBody::Text(text.to_string()),
        })
    }

    pub fn media(sender_id: UserId, receiver_id: UserId, media_url: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            body: MessageBody::Media(media_url.into()),
        }
    }
}

#[derive(Serialize)]
struct NewMessageWire<'a> {
    sender_id: &'a UserId,
    receiver_id: &'a UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_url: Option<&'a str>,
}

impl Serialize for NewMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (content, media_url) = match &self.body {
            MessageBody::Text(text) => (Some(text.as_str()), None),
            MessageBody::Media(url) => (None, Some(url.as_str())),
        };
        NewMessageWire {
            sender_id: &self.sender_id,
            receiver_id: &self.receiver_id,
            content,
            media_url,
        }
        .serialize(serializer)
    }
}
