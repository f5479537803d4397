use std::fmt;
use thiserror::Error;

pub const DEFAULT_MEDIA_BUCKET: &str = "media";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_HISTORY_LEN: usize = 5;
pub const NOT_CONFIGURED_REPLY: &str = "API key not configured. Cannot suggest reply.";
pub const FAILED_REPLY: &str = "Could not generate a suggestion.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the hosted backend, e.g. `https://abc.supabase.co`.
    pub backend_url: String,
    /// Public (anonymous) API key sent with every backend request.
    pub anon_key: String,
    /// Object storage bucket holding voice recordings.
    pub media_bucket: String,
    pub suggestion: SuggestionConfig,
}

impl ClientConfig {
    pub fn new(backend_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            media_bucket: DEFAULT_MEDIA_BUCKET.to_string(),
            suggestion: SuggestionConfig::default(),
        }
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `API_KEY` (or `GEMINI_API_KEY`),
    /// `GEMINI_MODEL` and `MEDIA_BUCKET`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env_var("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let key = env_var("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let mut config = Self::new(url, key);
        config.suggestion.api_key = env_var("API_KEY").or_else(|| env_var("GEMINI_API_KEY"));
        if let Some(model) = env_var("GEMINI_MODEL") {
            config.suggestion.model = model;
        }
        if let Some(bucket) = env_var("MEDIA_BUCKET") {
            config.media_bucket = bucket;
        }
        Ok(config)
    }

    pub fn with_gemini_key(mut self, api_key: Option<String>) -> Self {
        self.suggestion.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }

    /// Websocket URL of the realtime change feed.
    pub fn realtime_url(&self) -> String {
        let base = if let Some(rest) = self.backend_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.backend_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.backend_url.clone()
        };
        format!(
            "{base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            urlencoding::encode(&self.anon_key)
        )
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct SuggestionConfig {
    /// Generative-language API key. Without it suggestions return
    /// `not_configured_reply` and never touch the network.
    pub api_key: Option<String>,
    pub model: String,
    /// How many trailing messages are sent as context.
    pub history_len: usize,
    pub not_configured_reply: String,
    pub failed_reply: String,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            history_len: DEFAULT_HISTORY_LEN,
            not_configured_reply: NOT_CONFIGURED_REPLY.to_string(),
            failed_reply: FAILED_REPLY.to_string(),
        }
    }
}

impl fmt::Debug for SuggestionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuggestionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("history_len", &self.history_len)
            .finish()
    }
}
