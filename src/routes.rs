use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::{
    error::ApiError,
    generator::{GenerationError, RoadmapGenerator},
    models::{GenerationRequest, RoadmapDocument, RoadmapForm, RoadmapResponse},
    pdf::{export_file_name, generate_pdf},
    session::{Session, SessionError, SessionView},
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    /// `None` when no api key is configured.
    pub generator: Option<RoadmapGenerator>,
}

impl AppState {
    pub fn new(generator: Option<RoadmapGenerator>) -> Self {
        Self { sessions: Arc::default(), generator }
    }

    fn generator(&self) -> Result<&RoadmapGenerator, ApiError> {
        self.generator.as_ref().ok_or(ApiError::MissingApiKey)
    }
}

pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-client-info"),
            header::HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/generate-roadmap", post(generate_roadmap))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/generate", post(generate_for_session))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/phases/:phase_id/toggle", post(toggle_phase))
        .route("/api/sessions/:id/pdf", get(export_pdf))
        .layer(cors_layer())
        .with_state(state)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Stateless relay: form in, roadmap with flowchart out.
pub async fn generate_roadmap(
    State(state): State<AppState>,
    Json(form): Json<RoadmapForm>,
) -> Result<Json<RoadmapResponse>, ApiError> {
    tracing::info!("📨 Relay request: {:?}", form);
    let request = GenerationRequest::from_form(&form)?;
    let roadmap = state.generator()?.generate(&request).await?;
    Ok(Json(RoadmapResponse::from(roadmap)))
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    let session = Session::new();
    let view = session.view();
    state.sessions.write().insert(session.id, session);
    tracing::info!("🆕 Created session {}", view.id);
    (StatusCode::CREATED, Json(view))
}

pub async fn get_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let guard = state.sessions.read();
    let session = guard.get(&id).ok_or(ApiError::SessionNotFound(id))?;
    Ok(Json(session.view()))
}

pub async fn generate_for_session(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(form): Json<RoadmapForm>,
) -> Result<Json<SessionView>, ApiError> {
    let request = GenerationRequest::from_form(&form)?;
    let generator = state.generator()?.clone();

    // Claim the slot, then generate outside the lock
    {
        let mut guard = state.sessions.write();
        let session = guard.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
        if let Err(e) = session.begin_generation() {
            tracing::warn!("⏳ Session {} already has a generation in flight", id);
            return Err(e.into());
        }
    }

    // The outcome is written back by the task, so the slot is released even
    // if this handler is dropped when the client goes away.
    let sessions = Arc::clone(&state.sessions);
    let task = tokio::spawn(async move {
        let outcome = generator.generate(&request).await;
        let view = record_outcome(&sessions, id, &outcome);
        (outcome, view)
    });

    let (outcome, view) = match task.await {
        Ok(done) => done,
        Err(e) => {
            tracing::error!("💥 Generation task for session {} did not finish: {}", id, e);
            let outcome = Err(GenerationError::Interrupted(e.to_string()));
            let view = record_outcome(&state.sessions, id, &outcome);
            (outcome, view)
        }
    };
    outcome?;
    Ok(Json(view?))
}

fn record_outcome(
    sessions: &RwLock<HashMap<Uuid, Session>>,
    id: Uuid,
    outcome: &Result<RoadmapDocument, GenerationError>,
) -> Result<SessionView, ApiError> {
    let mut guard = sessions.write();
    let session = guard.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
    session.finish_generation(outcome)?;
    Ok(session.view())
}

pub async fn reset_session(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<Json<SessionView>, ApiError> {
    let mut guard = state.sessions.write();
    let session = guard.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
    session.reset()?;
    tracing::info!("🔄 Session {} reset", id);
    Ok(Json(session.view()))
}

pub async fn toggle_phase(
    Path((id, phase_id)): Path<(Uuid, String)>,
    State(state): State<AppState>,
) -> Result<Json<SessionView>, ApiError> {
    let mut guard = state.sessions.write();
    let session = guard.get_mut(&id).ok_or(ApiError::SessionNotFound(id))?;
    let complete = session.toggle_phase(&phase_id)?;
    tracing::info!("✅ Session {} phase '{}' complete={}", id, phase_id, complete);
    Ok(Json(session.view()))
}

pub async fn export_pdf(Path(id): Path<Uuid>, State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let roadmap = {
        let guard = state.sessions.read();
        let session = guard.get(&id).ok_or(ApiError::SessionNotFound(id))?;
        session.roadmap().cloned().ok_or(SessionError::NoRoadmap)?
    };
    let pdf_bytes = generate_pdf(&roadmap)?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&roadmap.title));
    tracing::info!("📄 Exported roadmap '{}' ({} bytes)", roadmap.title, pdf_bytes.len());
    Ok((
        [(header::CONTENT_TYPE, "application/pdf".to_string()), (header::CONTENT_DISPOSITION, disposition)],
        pdf_bytes,
    ))
}
