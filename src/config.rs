use std::collections::HashMap;
use tracing::warn;

use crate::gemini::{GenerationConfig, KeyPlacement};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    /// `None` leaves the server running; generation then fails with a configuration error.
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub key_placement: KeyPlacement,
    pub generation_config: Option<GenerationConfig>,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            key_placement: KeyPlacement::Header,
            generation_config: Some(GenerationConfig::default()),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }

    fn from_vars(vars: &HashMap<String, String>) -> Self {
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let api_key = get("GEMINI_API_KEY").map(str::to_string);
        if api_key.is_none() {
            warn!("⚠️ GEMINI_API_KEY not set; roadmap generation will fail until it is configured");
        }

        let key_placement = match get("GEMINI_KEY_PLACEMENT").map(str::to_ascii_lowercase).as_deref() {
            Some("query") => KeyPlacement::Query,
            Some("header") | None => KeyPlacement::Header,
            Some(other) => {
                warn!("Unknown GEMINI_KEY_PLACEMENT '{}', using header", other);
                KeyPlacement::Header
            }
        };

        let generation_config = match get("GEMINI_GENERATION_CONFIG").map(str::to_ascii_lowercase).as_deref() {
            Some("off") | Some("false") | Some("0") => None,
            _ => defaults.generation_config,
        };

        let port = get("PORT").and_then(|v| v.parse().ok()).unwrap_or(defaults.port);

        Self {
            api_key,
            api_base: get("GEMINI_API_BASE").map(str::to_string).unwrap_or(defaults.api_base),
            model: get("GEMINI_MODEL").map(str::to_string).unwrap_or(defaults.model),
            key_placement,
            generation_config,
            port,
        }
    }
}
