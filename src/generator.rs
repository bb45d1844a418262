//! Roadmap generation shared by the relay endpoint and the session surface:
//! prompt, completion, extraction, shaping.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

use crate::extract::{extract_json, ExtractError};
use crate::gemini::GeminiError;
use crate::models::{GenerationRequest, RoadmapDocument};
use crate::prompt::build_roadmap_prompt;

pub const USER_FACING_FAILURE: &str = "Failed to generate roadmap. Please try again.";

/// Something that turns a prompt into one text completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GeminiError>;
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] GeminiError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Failed to parse roadmap data: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("roadmap generation stopped before finishing: {0}")]
    Interrupted(String),
}

impl GenerationError {
    pub fn user_message(&self) -> &'static str { USER_FACING_FAILURE }
}

#[derive(Clone)]
pub struct RoadmapGenerator {
    client: Arc<dyn CompletionClient>,
}

impl RoadmapGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self { Self { client } }

    pub async fn generate(&self, req: &GenerationRequest) -> Result<RoadmapDocument, GenerationError> {
        info!("🚀 Generating roadmap for topic '{}' ({}, {})", req.topic(), req.level(), req.duration());
        let prompt = build_roadmap_prompt(req);
        let completion = self.client.complete(&prompt).await?;

        let value = extract_json(&completion).map_err(|e| {
            if let ExtractError::Parse { slice, .. } = &e {
                error!("❌ JSON parse error: {}; attempted to parse: {}", e, slice);
            } else {
                error!("❌ {}; completion was: {}", e, completion);
            }
            e
        })?;

        let mut roadmap: RoadmapDocument = serde_json::from_value(value).map_err(|e| {
            error!("❌ Roadmap JSON has an unexpected shape: {}", e);
            GenerationError::Shape(e)
        })?;
        roadmap.normalize_phase_ids();

        info!("✅ Roadmap '{}' generated with {} phases", roadmap.title, roadmap.phases.len());
        Ok(roadmap)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedClient, SAMPLE_ROADMAP};
    use super::*;
    use crate::models::SkillLevel;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    fn request() -> GenerationRequest {
        GenerationRequest::new("Rust", SkillLevel::Beginner, "3 months", None).unwrap()
    }

    #[tokio::test]
    async fn fenced_completion_becomes_roadmap() {
        let client = Arc::new(ScriptedClient::replying(vec![Ok(format!("```json\n{SAMPLE_ROADMAP}\n```"))]));
        let generator = RoadmapGenerator::new(client.clone());

        let roadmap = generator.generate(&request()).await.unwrap();
        assert_eq!(roadmap.title, "Rust Roadmap");
        let ids: Vec<_> = roadmap.phases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["phase-1", "phase-2"]);
        assert_eq!(client.call_count(), 1);
        assert!(client.prompts.lock()[0].contains("\"Rust\""));
    }

    #[tokio::test]
    async fn http_failures_are_not_retried() {
        let client = Arc::new(ScriptedClient::replying(vec![
            Err(GeminiError::Http { status: StatusCode::INTERNAL_SERVER_ERROR, body: String::new() }),
            Ok(SAMPLE_ROADMAP.to_string()),
        ]));
        let generator = RoadmapGenerator::new(client.clone());

        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Llm(GeminiError::Http { .. })));
        assert_eq!(err.user_message(), USER_FACING_FAILURE);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn chatty_completion_without_json_fails() {
        let client = Arc::new(ScriptedClient::replying(vec![Ok("I cannot help with that.".into())]));
        let err = RoadmapGenerator::new(client).generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Extract(ExtractError::NoJson)));
    }

    #[tokio::test]
    async fn repeated_phase_ids_from_the_model_are_made_unique() {
        let reply = r#"{"title": "x", "phases": [{"id": "phase-1"}, {"id": "phase-1"}, {"id": "end"}]}"#;
        let client = Arc::new(ScriptedClient::replying(vec![Ok(reply.into())]));
        let roadmap = RoadmapGenerator::new(client).generate(&request()).await.unwrap();
        let ids: Vec<_> = roadmap.phases.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["phase-1", "phase-2", "phase-3"]);
    }

    #[tokio::test]
    async fn wrongly_typed_fields_fail_shaping() {
        let client = Arc::new(ScriptedClient::replying(vec![Ok(r#"{"title": "x", "phases": "none"}"#.into())]));
        let err = RoadmapGenerator::new(client).generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Shape(_)));
    }
}
