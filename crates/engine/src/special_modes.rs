// ABOUTME: Adapts pre-fetched "top" aggregate payloads onto the ContentSummary shape.
// ABOUTME: TopContents/TopRated pass through unfiltered; TopTags yields tag aggregates for display.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::EngineError;
use crate::models::{ContentSummary, SpecialMode};
use crate::normalizer::Normalizer;
use crate::raw::{coerce_text, json_kind, RawRecord};

/// One row of the top-tags aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAggregate {
    pub tag: String,
    pub label: String,
    pub view_count: u64,
}

const TAG_KEYS: &[&str] = &["tag", "name", "nombre"];
const LABEL_KEYS: &[&str] = &["label", "etiqueta", "title"];
const COUNT_KEYS: &[&str] = &["count", "view_count", "views", "vistas"];

impl TagAggregate {
    /// Parses `[tag, label, count]` or an object with tag/label/count keys.
    /// The label falls back to the tag, the count to zero.
    pub fn from_value(value: &Value) -> Result<Self, EngineError> {
        let (tag, label, count) = match value {
            Value::Array(parts) => (parts.first(), parts.get(1), parts.get(2)),
            Value::Object(map) => (
                pick(map, TAG_KEYS),
                pick(map, LABEL_KEYS),
                pick(map, COUNT_KEYS),
            ),
            other => {
                return Err(EngineError::invalid_input(format!(
                    "expected a tag aggregate array or object, got {}",
                    json_kind(other)
                )))
            }
        };

        let tag = tag
            .and_then(coerce_text)
            .ok_or_else(|| EngineError::invalid_input("tag aggregate has no tag"))?;
        let label = label.and_then(coerce_text).unwrap_or_else(|| tag.clone());
        let view_count = count.map(coerce_count).unwrap_or(0);

        Ok(Self {
            tag: tag.to_lowercase(),
            label,
            view_count,
        })
    }
}

fn pick<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| map.get(*k).filter(|v| !v.is_null()))
}

fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// A decoded special-mode payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialPayload {
    TopTags(Vec<TagAggregate>),
    Contents(Vec<RawRecord>),
}

impl SpecialPayload {
    /// Decodes the opaque payload for `mode`. Both shapes are JSON arrays;
    /// rows that do not fit the shape are skipped.
    pub fn from_value(mode: SpecialMode, value: &Value) -> Result<Self, EngineError> {
        let Value::Array(rows) = value else {
            return Err(EngineError::invalid_input(format!(
                "special payload must be an array, got {}",
                json_kind(value)
            )));
        };

        // a malformed row only costs that row
        Ok(match mode {
            SpecialMode::TopTags => SpecialPayload::TopTags(
                rows.iter()
                    .enumerate()
                    .filter_map(|(idx, row)| skip_bad_row(idx, TagAggregate::from_value(row)))
                    .collect(),
            ),
            SpecialMode::TopContents | SpecialMode::TopRated => SpecialPayload::Contents(
                rows.iter()
                    .enumerate()
                    .filter_map(|(idx, row)| skip_bad_row(idx, RawRecord::from_value(row.clone())))
                    .collect(),
            ),
        })
    }
}

fn skip_bad_row<T>(idx: usize, row: Result<T, EngineError>) -> Option<T> {
    match row {
        Ok(v) => Some(v),
        Err(err) => {
            debug!(row = idx, error = %err, "skipping special payload row");
            None
        }
    }
}

/// What a special mode hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialResolution {
    /// Display-only list; never filtered.
    Contents(Vec<ContentSummary>),
    /// Tag aggregates to show; content filtering by the selected tags runs through the normal pipeline.
    Tags(Vec<TagAggregate>),
}

/// Maps a special payload onto the engine's data shape.
pub fn resolve(
    mode: SpecialMode,
    payload: SpecialPayload,
    normalizer: &Normalizer,
) -> Result<SpecialResolution, EngineError> {
    match (mode, payload) {
        (SpecialMode::TopTags, SpecialPayload::TopTags(tags)) => Ok(SpecialResolution::Tags(tags)),
        (SpecialMode::TopContents | SpecialMode::TopRated, SpecialPayload::Contents(records)) => {
            Ok(SpecialResolution::Contents(
                records.iter().map(|r| normalizer.normalize(r)).collect(),
            ))
        }
        (mode, _) => Err(EngineError::invalid_input(format!(
            "payload does not match special mode {:?}",
            mode
        ))),
    }
}
