use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::generator::CompletionClient;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error! status: {status} - {body}")]
    Http { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("Invalid response format from Gemini API")]
    InvalidResponse,
    #[error("could not decode Gemini response: {0}")]
    Decode(String),
}

/// Where the api key travels on the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPlacement {
    /// `x-goog-api-key` header, used by the server relay.
    #[default]
    Header,
    /// `?key=` query parameter, used by the browser-side variant.
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self { temperature: 0.7, top_k: 40, top_p: 0.95, max_output_tokens: 8192 }
    }
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    placement: KeyPlacement,
    generation_config: Option<GenerationConfig>,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            placement: KeyPlacement::default(),
            generation_config: Some(GenerationConfig::default()),
        }
    }

    /// Builds a client from configuration, or `None` when no api key is set.
    pub fn from_config(config: &Config) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        Some(
            Self::new(api_key, config.api_base.clone(), config.model.clone())
                .with_placement(config.key_placement)
                .with_generation_config(config.generation_config),
        )
    }

    pub fn with_placement(mut self, placement: KeyPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_generation_config(mut self, config: Option<GenerationConfig>) -> Self {
        self.generation_config = config;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = self.endpoint();
        info!("🔗 Making request to: {} ({:?} credential)", url, self.placement);

        let mut payload = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }]
        });
        if let Some(config) = &self.generation_config {
            payload["generationConfig"] = json!(config);
        }

        let request = match self.placement {
            KeyPlacement::Header => self.client.post(&url).header(API_KEY_HEADER, &self.api_key),
            KeyPlacement::Query => self.client.post(&url).query(&[("key", self.api_key.as_str())]),
        };

        let response = request
            .json(&payload)
            .send()
            .await
            .map_err(|e| GeminiError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);
        let response_text = response.text().await.map_err(|e| GeminiError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            error!("❌ Gemini API error {}: {}", status, response_text);
            return Err(GeminiError::Http { status, body: response_text });
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Decode(e.to_string()))?;

        let text = first_candidate_text(parsed)?;
        info!("✅ Completion received ({} chars)", text.len());
        Ok(text)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GeminiError> {
        self.generate_text(prompt).await
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Option<Content> }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Other(serde_json::Value),
}

fn first_candidate_text(resp: GeminiResponse) -> Result<String, GeminiError> {
    let content = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or(GeminiError::InvalidResponse)?;
    match content.parts.into_iter().next() {
        Some(Part::Text { text }) => Ok(text),
        Some(Part::Other(_)) | None => Err(GeminiError::InvalidResponse),
    }
}
