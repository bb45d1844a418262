use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::generator::{GenerationError, USER_FACING_FAILURE};
use crate::models::ValidationError;
use crate::pdf::ExportError;
use crate::session::SessionError;

pub const MISSING_KEY_DETAILS: &str = "GEMINI_API_KEY not found in environment";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("{}", MISSING_KEY_DETAILS)]
    MissingApiKey,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Session(SessionError::AlreadyInFlight | SessionError::NotInFlight) => StatusCode::CONFLICT,
            ApiError::Session(SessionError::NoRoadmap | SessionError::UnknownPhase(_)) => StatusCode::NOT_FOUND,
            ApiError::MissingApiKey | ApiError::Generation(_) | ApiError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn headline(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Topic Required",
            ApiError::SessionNotFound(_) | ApiError::Session(_) => "Request could not be completed",
            ApiError::MissingApiKey | ApiError::Generation(_) => USER_FACING_FAILURE,
            ApiError::Export(_) => "Failed to export roadmap",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("❌ {}", self);
        }
        let body = json!({ "error": self.headline(), "details": self.to_string() });
        (status, Json(body)).into_response()
    }
}
