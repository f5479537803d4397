//! AI reply suggestions.
//!
//! Failures never reach the caller: a missing credential or a failed request
//! turns into one of the configured placeholder replies.

use std::sync::Arc;

use async_trait::async_trait;
use chatcore::prompt::suggestion_prompt;
use chatcore::types::Message;
use log::{debug, error};

use crate::config::SuggestionConfig;
use crate::gemini::GeminiClient;
use crate::http::HttpClient;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub struct ReplySuggester {
    generator: Option<Arc<dyn TextGenerator>>,
    config: SuggestionConfig,
}

impl ReplySuggester {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, config: SuggestionConfig) -> Self {
        Self { generator, config }
    }

    /// Uses [`GeminiClient`] when the config carries an API key.
    pub fn from_config(config: SuggestionConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let generator = config.api_key.as_ref().map(|key| {
            Arc::new(GeminiClient::new(http_client, key.clone(), config.model.clone()))
                as Arc<dyn TextGenerator>
        });
        Self::new(generator, config)
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Suggests a reply to the trailing messages of a conversation.
    pub async fn suggest(&self, messages: &[Message]) -> String {
        let Some(generator) = &self.generator else {
            return self.config.not_configured_reply.clone();
        };

        let start = messages.len().saturating_sub(self.config.history_len);
        let prompt = suggestion_prompt(&messages[start..]);
        debug!("Requesting suggestion for {} messages", messages.len() - start);

        match generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Error generating reply suggestion: {e:?}");
                self.config.failed_reply.clone()
            }
        }
    }
}
