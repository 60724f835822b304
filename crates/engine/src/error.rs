// ABOUTME: Error types for the curator engine.
// ABOUTME: EngineError aborts a call; FieldIssue records a per-item, recoverable problem.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::{CanonicalField, Dimension};

/// Errors that abort a whole engine call.
///
/// Nothing a single malformed record does can produce one of these; they
/// come from the shape of the call itself (bad JSON, a special mode without
/// its payload, an unusable config).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The caller handed over input the engine cannot work with at all.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// JSON could not be decoded into the expected shape.
    #[error("failed to decode json: {0}")]
    Json(#[from] serde_json::Error),

    /// The engine configuration is inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Creates an InvalidInput error with a custom message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EngineError::InvalidInput(msg.into())
    }

    /// Creates an InvalidConfig error with a custom message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfig(msg.into())
    }
}

/// A recoverable, per-item problem surfaced to the caller for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldIssue {
    /// A raw field was present but in a shape no coercion accepts.
    #[error("record {id}: field `{key}` has an unrecognized value for {field}")]
    Unrecognized {
        id: String,
        field: CanonicalField,
        key: String,
    },

    /// A field the active criteria needs is still unknown; the item was excluded.
    #[error("record {id}: {dimension} is unknown, excluded from results")]
    MissingRequiredForFilter { id: String, dimension: Dimension },

    /// The caller's detail fetch failed for this id.
    #[error("record {id}: detail fetch failed: {reason}")]
    EnrichmentFetchFailure { id: String, reason: String },
}

impl FieldIssue {
    /// Creates an EnrichmentFetchFailure from any displayable error.
    pub fn fetch_failure(id: impl Into<String>, reason: impl fmt::Display) -> Self {
        FieldIssue::EnrichmentFetchFailure {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// The record id this issue belongs to.
    pub fn id(&self) -> &str {
        match self {
            FieldIssue::Unrecognized { id, .. }
            | FieldIssue::MissingRequiredForFilter { id, .. }
            | FieldIssue::EnrichmentFetchFailure { id, .. } => id,
        }
    }
}
