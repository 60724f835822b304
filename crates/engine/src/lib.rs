// ABOUTME: Content metadata normalization and multi-criteria filtering engine.
// ABOUTME: Provides field coercion, record normalization, predicates, enrichment planning and special modes.

pub mod age_parse;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod predicate;
pub mod raw;
pub mod resolution_parse;
pub mod special_modes;
pub mod tag_parse;

pub use age_parse::coerce_age;
pub use config::{EngineConfig, EngineConfigBuilder, MissingIdPolicy};
pub use enrichment::{
    fetch_details, merge, merge_detailed, plan_missing, required_fields, DetailOutcome,
    DetailTable, MergeStats, Merged, RequiredFields,
};
pub use error::{EngineError, FieldIssue};
pub use models::{
    AgeFilter, AgeRating, CanonicalField, ContentKind, ContentSummary, CriteriaBuilder,
    Dimension, FilterCriteria, Resolution, SpecialMode, Subscription,
};
pub use normalizer::{normalize, Normalized, Normalizer};
pub use pipeline::{Engine, FilterOutcome};
pub use predicate::{evaluate, filter_batch, matches, Verdict};
pub use raw::{coerce_flag, coerce_text, RawRecord};
pub use resolution_parse::coerce_resolution;
pub use special_modes::{resolve, SpecialPayload, SpecialResolution, TagAggregate};
pub use tag_parse::coerce_tags;
