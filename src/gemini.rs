//! Generative-language text client.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::http::{HttpClient, HttpRequest, error_message};
use crate::suggest::TextGenerator;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiClient {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };
        let request = HttpRequest::post(self.url())
            .with_header("x-goog-api-key", self.api_key.clone())
            .with_json(&body)?;

        debug!("--> POST {}", request.url);
        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(anyhow::anyhow!(
                "generateContent returned {}: {}",
                response.status_code,
                error_message(&response)
            ));
        }

        let parsed: GenerateResponse = response.json()?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow::anyhow!("generateContent returned no text"));
        }
        Ok(text.to_string())
    }
}
