use std::sync::Arc;

use chatcore::media::audio_object_path;
use chatcore::types::{MessageRow, NewMessage, UserId};
use log::{debug, error, info};
use thiserror::Error;

use crate::client::Client;
use crate::error::ClientError;
use crate::recorder::{AudioClip, CaptureError};

pub const MESSAGES_TABLE: &str = "messages";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to upload recording: {0}")]
    Upload(ClientError),
    #[error("no public URL for {0}")]
    PublicUrl(String),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// Outgoing side of one conversation: the draft and the two send paths.
pub struct Composer {
    client: Arc<Client>,
    contact: UserId,
    draft: String,
}

impl Composer {
    pub fn new(client: Arc<Client>, contact: UserId) -> Self {
        Self {
            client,
            contact,
            draft: String::new(),
        }
    }

    pub fn contact(&self) -> &UserId {
        &self.contact
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Sends the draft as a text message and clears it.
    ///
    /// A blank draft is rejected before any request is made. The draft is kept
    /// when the insert fails.
    pub async fn send_text(&mut self) -> Result<MessageRow, ComposeError> {
        let session = self.client.require_session().await?;
        let message = NewMessage::text(session.user.id, self.contact.clone(), &self.draft)
            .ok_or(ComposeError::EmptyMessage)?;

        let row: MessageRow = self.client.insert(MESSAGES_TABLE, &message).await?;
        debug!("send_text: stored message {}", row.id);
        self.draft.clear();
        Ok(row)
    }

    /// Uploads a recording and sends a media message pointing at it.
    pub async fn send_audio(&self, clip: AudioClip) -> Result<MessageRow, ComposeError> {
        if clip.is_empty() {
            return Err(CaptureError::Empty.into());
        }
        let session = self.client.require_session().await?;
        let bucket = self.client.config.media_bucket.clone();
        let path = audio_object_path(&session.user.id, chrono::Utc::now().timestamp_millis());

        let stored = self
            .client
            .upload(&bucket, &path, clip.data, &clip.mime_type)
            .await
            .map_err(|e| {
                error!("Audio upload to {bucket}/{path} failed: {e}");
                ComposeError::Upload(e)
            })?;

        let Some(url) = self.client.public_url(&bucket, &stored.path) else {
            error!("No public URL for {}", stored.key);
            return Err(ComposeError::PublicUrl(stored.key));
        };

        let message = NewMessage::media(session.user.id, self.contact.clone(), url);
        let row: MessageRow = self.client.insert(MESSAGES_TABLE, &message).await?;
        info!("Sent voice message {} to {}", row.id, self.contact);
        Ok(row)
    }
}
