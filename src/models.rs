use serde::{Serialize, Deserialize};
use std::collections::HashSet;
use std::fmt;

use crate::diagram::{Diagram, END_NODE_ID, START_NODE_ID};

pub const DEFAULT_DURATION: &str = "3 months";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    #[default]
    #[serde(alias = "Beginner")]
    Beginner,
    #[serde(alias = "Intermediate")]
    Intermediate,
    #[serde(alias = "Advanced")]
    Advanced,
}

impl SkillLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Raw form body as submitted by a client. Every field is optional here;
/// [`GenerationRequest::from_form`] applies defaults and validation.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapForm {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, deserialize_with = "blank_level_as_none")]
    pub level: Option<SkillLevel>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

// Form selects submit "" when nothing was picked.
fn blank_level_as_none<'de, D>(deserializer: D) -> Result<Option<SkillLevel>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => SkillLevel::deserialize(serde::de::value::StrDeserializer::<D::Error>::new(s)).map(Some),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a topic or skill you want to learn.")]
    EmptyTopic,
}

/// One submission's worth of input, with defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    topic: String,
    level: SkillLevel,
    duration: String,
    additional_info: Option<String>,
}

impl GenerationRequest {
    pub fn new(topic: &str, level: SkillLevel, duration: &str, additional_info: Option<&str>) -> Result<Self, ValidationError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        let duration = match duration.trim() {
            "" => DEFAULT_DURATION,
            d => d,
        };
        let additional_info = additional_info
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(Self { topic: topic.to_string(), level, duration: duration.to_string(), additional_info })
    }

    pub fn from_form(form: &RoadmapForm) -> Result<Self, ValidationError> {
        Self::new(
            form.topic.as_deref().unwrap_or_default(),
            form.level.unwrap_or_default(),
            form.duration.as_deref().unwrap_or_default(),
            form.additional_info.as_deref(),
        )
    }

    pub fn topic(&self) -> &str { &self.topic }
    pub fn level(&self) -> SkillLevel { self.level }
    pub fn duration(&self) -> &str { &self.duration }
    pub fn additional_info(&self) -> Option<&str> { self.additional_info.as_deref() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Article,
    Course,
    Documentation,
    Project,
    #[default]
    #[serde(other)]
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "video",
            ResourceType::Article => "article",
            ResourceType::Course => "course",
            ResourceType::Documentation => "documentation",
            ResourceType::Project => "project",
            ResourceType::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Resource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Phase {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<Vec<String>>,
}

fn fallback_phase_id(index: usize) -> String { format!("phase-{}", index + 1) }

/// One id per phase, in order. The model's id is kept when it is non-blank,
/// not `start`/`end` and not already used by an earlier phase; anything else
/// becomes `phase-<n>` (suffixed `-2`, `-3`, ... if that is taken too).
pub fn unique_phase_ids(phases: &[Phase]) -> Vec<String> {
    let mut taken: HashSet<&str> = HashSet::from([START_NODE_ID, END_NODE_ID]);
    let kept: Vec<Option<&str>> = phases
        .iter()
        .map(|phase| {
            let id = phase.id.as_str();
            (!id.trim().is_empty() && taken.insert(id)).then_some(id)
        })
        .collect();

    let mut fallbacks: HashSet<String> = HashSet::new();
    kept.iter()
        .enumerate()
        .map(|(index, id)| match id {
            Some(id) => id.to_string(),
            None => {
                let base = fallback_phase_id(index);
                let mut candidate = base.clone();
                let mut suffix = 2;
                while taken.contains(candidate.as_str()) || fallbacks.contains(&candidate) {
                    candidate = format!("{base}-{suffix}");
                    suffix += 1;
                }
                fallbacks.insert(candidate.clone());
                candidate
            }
        })
        .collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub total_duration: String,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl RoadmapDocument {
    /// Re-keys blank, repeated and reserved phase ids so every phase can be
    /// addressed on its own.
    pub fn normalize_phase_ids(&mut self) {
        let ids = unique_phase_ids(&self.phases);
        for (phase, id) in self.phases.iter_mut().zip(ids) {
            phase.id = id;
        }
    }

    pub fn phase(&self, id: &str) -> Option<&Phase> { self.phases.iter().find(|p| p.id == id) }
}

/// Relay response body: the roadmap plus its derived flowchart.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapResponse {
    #[serde(flatten)]
    pub roadmap: RoadmapDocument,
    pub flowchart_data: Diagram,
}

impl From<RoadmapDocument> for RoadmapResponse {
    fn from(roadmap: RoadmapDocument) -> Self {
        let flowchart_data = Diagram::from_phases(&roadmap.phases);
        Self { roadmap, flowchart_data }
    }
}
