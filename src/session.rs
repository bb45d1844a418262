//! Per-session roadmap state: the request lifecycle, the current roadmap and
//! which phases the learner has marked complete.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;

use crate::diagram::Diagram;
use crate::generator::GenerationError;
use crate::models::RoadmapDocument;

/// `idle -> in_flight -> succeeded | failed`; a finished session may start again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestState {
    Idle,
    InFlight,
    Succeeded,
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a roadmap is already being generated for this session")]
    AlreadyInFlight,
    #[error("no generation is in flight")]
    NotInFlight,
    #[error("no roadmap has been generated yet")]
    NoRoadmap,
    #[error("unknown phase '{0}'")]
    UnknownPhase(String),
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    state: RequestState,
    roadmap: Option<RoadmapDocument>,
    completed: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            state: RequestState::Idle,
            roadmap: None,
            completed: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn state(&self) -> &RequestState { &self.state }
    pub fn roadmap(&self) -> Option<&RoadmapDocument> { self.roadmap.as_ref() }
    pub fn is_in_flight(&self) -> bool { self.state == RequestState::InFlight }

    /// Claims the single generation slot. Fails while another request is outstanding.
    pub fn begin_generation(&mut self) -> Result<(), SessionError> {
        if self.is_in_flight() {
            return Err(SessionError::AlreadyInFlight);
        }
        self.state = RequestState::InFlight;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records the outcome of the outstanding request. A new roadmap replaces
    /// the old one wholesale and clears completion marks; a failure keeps the
    /// previous roadmap.
    pub fn finish_generation(&mut self, outcome: &Result<RoadmapDocument, GenerationError>) -> Result<(), SessionError> {
        if !self.is_in_flight() {
            return Err(SessionError::NotInFlight);
        }
        self.state = match outcome {
            Ok(roadmap) => {
                self.roadmap = Some(roadmap.clone());
                self.completed.clear();
                RequestState::Succeeded
            }
            Err(e) => RequestState::Failed { message: e.user_message().to_string() },
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Drops the roadmap and completion marks and returns to `idle`.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.is_in_flight() {
            return Err(SessionError::AlreadyInFlight);
        }
        self.state = RequestState::Idle;
        self.roadmap = None;
        self.completed.clear();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Flips a phase between complete and not complete; returns the new flag.
    pub fn toggle_phase(&mut self, phase_id: &str) -> Result<bool, SessionError> {
        let roadmap = self.roadmap.as_ref().ok_or(SessionError::NoRoadmap)?;
        if roadmap.phase(phase_id).is_none() {
            return Err(SessionError::UnknownPhase(phase_id.to_string()));
        }
        let now_complete = if self.completed.remove(phase_id) {
            false
        } else {
            self.completed.insert(phase_id.to_string());
            true
        };
        self.updated_at = Utc::now();
        Ok(now_complete)
    }

    pub fn progress(&self) -> Progress {
        let total = self.roadmap.as_ref().map_or(0, |r| r.phases.len());
        Progress::new(self.completed.len(), total)
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            state: self.state.clone(),
            roadmap: self.roadmap.clone(),
            flowchart_data: self.roadmap.as_ref().map(|r| Diagram::from_phases(&r.phases)),
            completed_phases: self.completed.iter().cloned().collect(),
            progress: self.progress(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Default for Session {
    fn default() -> Self { Self::new() }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    fn new(completed: usize, total: usize) -> Self {
        let percent = if total == 0 { 0 } else { (completed * 100 / total).min(100) as u8 };
        Self { completed, total, percent }
    }
}

/// Serializable snapshot returned by the session endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub state: RequestState,
    pub roadmap: Option<RoadmapDocument>,
    pub flowchart_data: Option<Diagram>,
    pub completed_phases: Vec<String>,
    pub progress: Progress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractError;
    use crate::models::Phase;
    use pretty_assertions::assert_eq;

    fn roadmap(ids: &[&str]) -> RoadmapDocument {
        RoadmapDocument {
            title: "Roadmap".into(),
            phases: ids.iter().map(|id| Phase { id: id.to_string(), ..Default::default() }).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn second_begin_is_rejected_while_in_flight() {
        let mut session = Session::new();
        assert_eq!(session.state(), &RequestState::Idle);
        session.begin_generation().unwrap();
        assert_eq!(session.begin_generation(), Err(SessionError::AlreadyInFlight));
        assert!(session.is_in_flight());
    }

    #[test]
    fn success_replaces_roadmap_and_clears_progress() {
        let mut session = Session::new();
        session.begin_generation().unwrap();
        session.finish_generation(&Ok(roadmap(&["a", "b"]))).unwrap();
        assert_eq!(session.toggle_phase("a"), Ok(true));
        assert_eq!(session.progress(), Progress { completed: 1, total: 2, percent: 50 });

        session.begin_generation().unwrap();
        session.finish_generation(&Ok(roadmap(&["x", "y", "z"]))).unwrap();
        assert_eq!(session.state(), &RequestState::Succeeded);
        assert!(session.view().completed_phases.is_empty());
        assert_eq!(session.progress(), Progress { completed: 0, total: 3, percent: 0 });
    }

    #[test]
    fn failure_keeps_previous_roadmap() {
        let mut session = Session::new();
        session.begin_generation().unwrap();
        session.finish_generation(&Ok(roadmap(&["a"]))).unwrap();

        session.begin_generation().unwrap();
        session.finish_generation(&Err(GenerationError::Extract(ExtractError::NoJson))).unwrap();
        assert_eq!(
            session.state(),
            &RequestState::Failed { message: "Failed to generate roadmap. Please try again.".into() }
        );
        assert_eq!(session.roadmap().map(|r| r.phases.len()), Some(1));
        session.begin_generation().unwrap();
    }

    #[test]
    fn finish_without_begin_is_an_error() {
        let mut session = Session::new();
        assert_eq!(session.finish_generation(&Ok(roadmap(&[]))), Err(SessionError::NotInFlight));
    }

    #[test]
    fn toggling_requires_a_known_phase() {
        let mut session = Session::new();
        assert_eq!(session.toggle_phase("a"), Err(SessionError::NoRoadmap));
        session.begin_generation().unwrap();
        session.finish_generation(&Ok(roadmap(&["a"]))).unwrap();
        assert_eq!(session.toggle_phase("nope"), Err(SessionError::UnknownPhase("nope".into())));
        assert_eq!(session.toggle_phase("a"), Ok(true));
        assert_eq!(session.toggle_phase("a"), Ok(false));
        assert_eq!(session.progress().percent, 0);
    }

    #[test]
    fn reset_clears_roadmap_but_not_while_in_flight() {
        let mut session = Session::new();
        session.begin_generation().unwrap();
        assert_eq!(session.reset(), Err(SessionError::AlreadyInFlight));
        session.finish_generation(&Ok(roadmap(&["a", "b"]))).unwrap();
        session.toggle_phase("a").unwrap();

        session.reset().unwrap();
        assert_eq!(session.state(), &RequestState::Idle);
        assert!(session.roadmap().is_none());
        assert_eq!(session.progress(), Progress { completed: 0, total: 0, percent: 0 });
        assert_eq!(session.toggle_phase("a"), Err(SessionError::NoRoadmap));
        session.begin_generation().unwrap();
    }

    #[test]
    fn view_serializes_state_tag() {
        let mut session = Session::new();
        session.begin_generation().unwrap();
        let value = serde_json::to_value(session.view()).unwrap();
        assert_eq!(value["state"]["status"], "in_flight");
        assert!(value["flowchartData"].is_null());
    }
}
