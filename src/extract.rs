//! Pulls the JSON object out of a chatty model completion.
//!
//! Models are asked for bare JSON but regularly wrap it in a markdown fence or
//! surround it with prose. This is a heuristic, not a parser: the object is
//! assumed to span from the first `{` to the last `}`.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

lazy_static! {
    static ref LEADING_FENCE: Regex = Regex::new(r"(?i)^\s*```(?:json)?\s*").unwrap();
    static ref TRAILING_FENCE: Regex = Regex::new(r"\s*```\s*$").unwrap();
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No valid JSON found in response")]
    NoJson,
    #[error("Failed to parse roadmap data: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        /// The slice that was handed to the JSON parser.
        slice: String,
    },
}

/// Removes an opening ```` ```json ```` / ```` ``` ```` fence and a closing ```` ``` ````.
pub fn strip_fences(text: &str) -> &str {
    let start = LEADING_FENCE.find(text).map_or(0, |m| m.end());
    let rest = &text[start..];
    let end = TRAILING_FENCE.find(rest).map_or(rest.len(), |m| m.start());
    &rest[..end]
}

/// Returns the `{ ... }` span of `text`, or `None` when no such span exists.
pub fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn extract_json(completion: &str) -> Result<Value, ExtractError> {
    let slice = object_span(strip_fences(completion)).ok_or(ExtractError::NoJson)?;
    serde_json::from_str(slice).map_err(|source| ExtractError::Parse { source, slice: slice.to_string() })
}
