// ABOUTME: Reduces a RawRecord to a canonical ContentSummary.
// ABOUTME: Each canonical field is resolved from an ordered table of historical source keys.

use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::age_parse::coerce_age;
use crate::config::{EngineConfig, MissingIdPolicy};
use crate::error::FieldIssue;
use crate::models::{AgeRating, CanonicalField, ContentKind, ContentSummary, Resolution};
use crate::raw::{coerce_flag, coerce_text, RawRecord};
use crate::resolution_parse::coerce_resolution;
use crate::tag_parse::coerce_tags;

/// Source keys for one canonical field, highest priority first.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: CanonicalField,
    pub keys: &'static [&'static str],
}

pub const ID_RULE: FieldRule = FieldRule {
    field: CanonicalField::Id,
    keys: &["id", "_id", "contentId", "content_id", "idAudio", "idVideo", "audioId", "videoId"],
};

pub const TITLE_RULE: FieldRule = FieldRule {
    field: CanonicalField::Title,
    keys: &["title", "titulo", "name", "nombre"],
};

pub const KIND_RULE: FieldRule = FieldRule {
    field: CanonicalField::Kind,
    keys: &["tipo", "type", "kind", "contentType", "tipoContenido"],
};

pub const PREMIUM_RULE: FieldRule = FieldRule {
    field: CanonicalField::Premium,
    keys: &["esVIP", "vip", "isVip", "premium", "isPremium", "soloSuscriptores", "isPremiumOnly"],
};

pub const TAGS_RULE: FieldRule = FieldRule {
    field: CanonicalField::Tags,
    keys: &["tags", "tag_list", "tags_list", "etiquetas"],
};

pub const AGE_RULE: FieldRule = FieldRule {
    field: CanonicalField::Age,
    keys: &["edad", "edadVisualizacion", "edadvisualizacion", "minimumAge", "ageRating"],
};

pub const RESOLUTION_RULE: FieldRule = FieldRule {
    field: CanonicalField::Resolution,
    keys: &["resolucion", "resolution", "calidad", "quality"],
};

/// A normalized record plus the fields that were present but unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub summary: ContentSummary,
    pub issues: Vec<FieldIssue>,
}

/// Reads canonical fields out of one raw record, remembering which present
/// keys failed to coerce.
pub(crate) struct FieldReader<'a> {
    raw: &'a RawRecord,
    misses: Vec<(CanonicalField, &'static str)>,
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(raw: &'a RawRecord) -> Self {
        Self {
            raw,
            misses: Vec::new(),
        }
    }

    /// First present key whose value coerces.
    fn resolve<T>(&mut self, rule: FieldRule, coerce: impl Fn(&Value) -> Option<T>) -> Option<T> {
        for key in rule.keys {
            if let Some(value) = self.raw.get(key) {
                match coerce(value) {
                    Some(v) => return Some(v),
                    None => self.misses.push((rule.field, *key)),
                }
            }
        }
        None
    }

    pub(crate) fn id(&mut self) -> Option<String> {
        self.resolve(ID_RULE, coerce_text)
    }

    pub(crate) fn title(&mut self) -> Option<String> {
        self.resolve(TITLE_RULE, coerce_text)
    }

    /// A type hint starting with 'a' (any case) is audio; everything else,
    /// including no hint at all, is video.
    pub(crate) fn kind(&mut self) -> ContentKind {
        let hint = self.resolve(KIND_RULE, |v| match v {
            Value::String(s) => s.trim().chars().next(),
            _ => None,
        });
        match hint {
            Some(c) if c.eq_ignore_ascii_case(&'a') => ContentKind::Audio,
            _ => ContentKind::Video,
        }
    }

    pub(crate) fn premium(&self) -> bool {
        PREMIUM_RULE
            .keys
            .iter()
            .filter_map(|key| self.raw.get(key))
            .any(coerce_flag)
    }

    pub(crate) fn tags(&mut self) -> Option<Vec<String>> {
        self.resolve(TAGS_RULE, coerce_tags)
    }

    pub(crate) fn age(&mut self) -> Option<AgeRating> {
        self.resolve(AGE_RULE, coerce_age)
    }

    pub(crate) fn resolution(&mut self) -> Option<Resolution> {
        self.resolve(RESOLUTION_RULE, coerce_resolution)
    }

    pub(crate) fn into_issues(self, id: &str) -> Vec<FieldIssue> {
        self.misses
            .into_iter()
            .map(|(field, key)| {
                debug!(id, %field, key, "unrecognized field value");
                FieldIssue::Unrecognized {
                    id: id.to_string(),
                    field,
                    key: key.to_string(),
                }
            })
            .collect()
    }
}

/// Turns raw upstream records into [`ContentSummary`] values.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: EngineConfig,
}

impl Normalizer {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalizes one record. Never fails: each field degrades to unknown on its own.
    pub fn normalize(&self, raw: &RawRecord) -> ContentSummary {
        self.normalize_detailed(raw).summary
    }

    /// Like [`Normalizer::normalize`], also reporting unusable fields.
    pub fn normalize_detailed(&self, raw: &RawRecord) -> Normalized {
        let mut reader = FieldReader::new(raw);

        let id = reader.id().unwrap_or_else(|| self.fallback_id(raw));
        let kind = reader.kind();

        let mut summary = ContentSummary::new(id, kind);
        summary.title = reader.title().unwrap_or_default();
        summary.is_premium_only = reader.premium();
        if let Some(tags) = reader.tags() {
            summary.set_tags(tags);
        }
        summary.minimum_age = reader.age();
        if summary.is_video() {
            summary.set_resolution(reader.resolution());
        }

        let issues = reader.into_issues(&summary.id);
        Normalized { summary, issues }
    }

    fn fallback_id(&self, raw: &RawRecord) -> String {
        let id = match self.config.missing_id {
            MissingIdPolicy::Random => Uuid::new_v4(),
            MissingIdPolicy::Derived { namespace } => {
                // serde_json's Map is ordered, so this text is stable per record
                let canonical = serde_json::to_string(raw.fields()).unwrap_or_default();
                Uuid::new_v5(&namespace, canonical.as_bytes())
            }
        };
        debug!(%id, "record has no identifier, generated one");
        id.to_string()
    }
}

/// Normalizes with the default configuration.
pub fn normalize(raw: &RawRecord) -> ContentSummary {
    Normalizer::default().normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[test]
    fn resolves_fields_in_priority_order() {
        let record = raw(json!({
            "_id": "secondary",
            "id": "primary",
            "tag_list": ["ignored"],
            "tags": "Rock, Pop",
            "edadvisualizacion": "18",
            "edad": "TP"
        }));
        let s = normalize(&record);
        assert_eq!(s.id, "primary");
        assert_eq!(s.tags.iter().cloned().collect::<Vec<_>>(), vec!["pop", "rock"]);
        assert_eq!(s.minimum_age, Some(AgeRating::AllAges));
    }

    #[test]
    fn falls_through_uncoercible_candidates() {
        let record = raw(json!({
            "id": 7,
            "tags": {"nested": true},
            "tags_list": ["indie"],
            "edad": "unknown",
            "edadVisualizacion": 0
        }));
        let out = Normalizer::default().normalize_detailed(&record);
        assert_eq!(out.summary.id, "7");
        assert!(out.summary.tags_known);
        assert!(out.summary.tags.contains("indie"));
        assert_eq!(out.summary.minimum_age, Some(AgeRating::AllAges));
        assert_eq!(out.issues.len(), 2);
        assert!(out.issues.iter().all(|i| i.id() == "7"));
    }

    #[test]
    fn kind_defaults_to_video() {
        assert_eq!(normalize(&raw(json!({"id": "1"}))).kind, ContentKind::Video);
        assert_eq!(normalize(&raw(json!({"id": "1", "tipo": ""}))).kind, ContentKind::Video);
        assert_eq!(normalize(&raw(json!({"id": "1", "type": 3}))).kind, ContentKind::Video);
        assert_eq!(normalize(&raw(json!({"id": "1", "type": "Audio"}))).kind, ContentKind::Audio);
        assert_eq!(normalize(&raw(json!({"id": "1", "tipo": "a"}))).kind, ContentKind::Audio);
    }

    #[test]
    fn audio_never_carries_resolution() {
        let s = normalize(&raw(json!({"id": "1", "tipo": "audio", "resolucion": "1080"})));
        assert_eq!(s.kind, ContentKind::Audio);
        assert_eq!(s.resolution, None);
    }

    #[test]
    fn premium_from_any_candidate() {
        assert!(normalize(&raw(json!({"id": "1", "vip": false, "isPremium": "true"}))).is_premium_only);
        assert!(!normalize(&raw(json!({"id": "1", "esVIP": "no"}))).is_premium_only);
        assert!(!normalize(&raw(json!({"id": "1"}))).is_premium_only);
    }

    #[test]
    fn tags_known_tracks_presence_not_emptiness() {
        let s = normalize(&raw(json!({"id": "1", "tags": ""})));
        assert!(s.tags_known);
        assert!(s.tags.is_empty());

        let s = normalize(&raw(json!({"id": "1"})));
        assert!(!s.tags_known);

        let s = normalize(&raw(json!({"id": "1", "tags": null})));
        assert!(!s.tags_known);
    }

    #[test]
    fn missing_id_is_generated() {
        let record = raw(json!({"title": "untitled"}));
        let a = normalize(&record);
        let b = normalize(&record);
        assert!(!a.id.is_empty());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn derived_missing_id_is_repeatable() {
        let config = EngineConfig::builder()
            .derived_ids(Uuid::NAMESPACE_OID)
            .build()
            .unwrap();
        let normalizer = Normalizer::new(config);
        let record = raw(json!({"title": "untitled", "tags": ["x"]}));
        assert_eq!(normalizer.normalize(&record), normalizer.normalize(&record));
    }

    #[test]
    fn normalization_is_deterministic_with_an_id() {
        let record = raw(json!({
            "id": "9", "titulo": "Song", "tipo": "video", "resolucion": "4k",
            "edad": 12, "tags": ["A", "b", "a"]
        }));
        let s = normalize(&record);
        assert_eq!(s, normalize(&record));
        assert_eq!(s.title, "Song");
        assert_eq!(s.resolution, Some(Resolution::Uhd));
        assert_eq!(s.minimum_age, Some(AgeRating::Restricted(12)));
        assert_eq!(s.tags.len(), 2);
    }
}
