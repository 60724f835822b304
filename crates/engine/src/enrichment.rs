// ABOUTME: Detail enrichment: decides which records need a detail fetch and merges the results back.
// ABOUTME: Fetches fan out concurrently and are all joined; each failure stays local to its id.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;

use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::error::FieldIssue;
use crate::models::{ContentSummary, FilterCriteria, SpecialMode};
use crate::normalizer::FieldReader;
use crate::raw::RawRecord;

/// Which canonical fields a criteria needs to be known before filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequiredFields {
    pub tags: bool,
    pub age: bool,
    pub resolution: bool,
}

impl RequiredFields {
    pub fn any(self) -> bool {
        self.tags || self.age || self.resolution
    }

    /// True when the item lacks something this set requires.
    pub fn missing_from(self, item: &ContentSummary) -> bool {
        (self.tags && !item.tags_known)
            || (self.age && item.minimum_age.is_none())
            || (self.resolution && item.is_video() && item.resolution.is_none())
    }
}

/// Fields required by `criteria`.
///
/// Age is required whenever any constraint is active, so an item whose age
/// turns out to disqualify it is never let through on an unknown. An
/// unconstrained criteria requires nothing. Under `TopTags` only tags can
/// change the verdict; pass-through modes require nothing.
pub fn required_fields(criteria: &FilterCriteria) -> RequiredFields {
    match criteria.special_mode {
        Some(mode) if mode.is_passthrough() => return RequiredFields::default(),
        Some(SpecialMode::TopTags) => {
            return RequiredFields {
                tags: !criteria.tags.is_empty(),
                ..RequiredFields::default()
            }
        }
        _ => {}
    }

    if criteria.is_unconstrained() {
        return RequiredFields::default();
    }

    RequiredFields {
        tags: !criteria.tags.is_empty(),
        age: true,
        resolution: !criteria.resolutions.is_empty(),
    }
}

/// Ids of records that need a detail fetch before `criteria` can be judged
/// accurately, in batch order without duplicates.
///
/// Outside special modes age is planned whenever any constraint is active.
/// Under `TopTags` only unknown tags are planned, because that mode's
/// predicate never looks at age, subscription or resolution; an item with
/// known tags and an unknown age is not requested there.
pub fn plan_missing(batch: &[ContentSummary], criteria: &FilterCriteria) -> Vec<String> {
    let required = required_fields(criteria);
    if !required.any() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    batch
        .iter()
        .filter(|item| required.missing_from(item))
        .filter(|item| seen.insert(item.id.as_str()))
        .map(|item| item.id.clone())
        .collect()
}

/// Result of one detail fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Fetched(RawRecord),
    /// The fetch succeeded but upstream had no detail for this id.
    NotFound,
    Failed(String),
}

/// Detail results keyed by record id.
pub type DetailTable = HashMap<String, DetailOutcome>;

/// Runs `fetch` for every id concurrently and waits for all of them.
///
/// Errors are converted to [`DetailOutcome::Failed`] for that id only.
/// Timeouts and cancellation belong to the future `fetch` returns.
pub async fn fetch_details<F, Fut, E>(ids: &[String], fetch: F) -> DetailTable
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Option<RawRecord>, E>>,
    E: fmt::Display,
{
    let mut seen = HashSet::new();
    let fetches = ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .map(|id| {
            let pending = fetch(id.clone());
            async move {
                let outcome = match pending.await {
                    Ok(Some(raw)) => DetailOutcome::Fetched(raw),
                    Ok(None) => DetailOutcome::NotFound,
                    Err(err) => {
                        debug!(id = id.as_str(), error = %err, "detail fetch failed");
                        DetailOutcome::Failed(err.to_string())
                    }
                };
                (id.clone(), outcome)
            }
        });

    join_all(fetches).await.into_iter().collect()
}

/// Counters from a merge, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    /// Records that had at least one unknown field filled.
    pub items_updated: usize,
    /// Records whose detail was fetched but added nothing.
    pub items_unchanged: usize,
    /// Records still missing a field whose fetch failed, found nothing,
    /// or has no entry in the table.
    pub items_without_detail: usize,
}

/// Merged batch plus what went wrong along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
    pub items: Vec<ContentSummary>,
    pub stats: MergeStats,
    /// Fetch failures and unusable detail fields.
    pub issues: Vec<FieldIssue>,
}

/// Fills previously-unknown fields from fetched details. See [`merge_detailed`].
pub fn merge(batch: Vec<ContentSummary>, details: &DetailTable) -> Vec<ContentSummary> {
    merge_detailed(batch, details).items
}

/// Fills previously-unknown fields from fetched details.
///
/// Fields already resolved from the summary are never overwritten. Records
/// without an entry, or whose fetch failed or found nothing, keep their unknowns and will
/// fail any constraint that needs them. Audio never gains a resolution.
pub fn merge_detailed(batch: Vec<ContentSummary>, details: &DetailTable) -> Merged {
    let mut stats = MergeStats::default();
    let mut issues = Vec::new();

    let items = batch
        .into_iter()
        .map(|mut item| {
            match details.get(&item.id) {
                None => {
                    if has_unknown_field(&item) {
                        stats.items_without_detail += 1;
                    }
                }
                Some(DetailOutcome::Fetched(raw)) => {
                    let mut reader = FieldReader::new(raw);
                    if fill_unknown(&mut item, &mut reader) {
                        stats.items_updated += 1;
                    } else {
                        stats.items_unchanged += 1;
                    }
                    issues.extend(reader.into_issues(&item.id));
                }
                Some(DetailOutcome::NotFound) => {
                    stats.items_without_detail += 1;
                }
                Some(DetailOutcome::Failed(reason)) => {
                    stats.items_without_detail += 1;
                    issues.push(FieldIssue::fetch_failure(item.id.as_str(), reason));
                }
            }
            item
        })
        .collect();

    Merged {
        items,
        stats,
        issues,
    }
}

fn has_unknown_field(item: &ContentSummary) -> bool {
    !item.tags_known
        || item.minimum_age.is_none()
        || (item.is_video() && item.resolution.is_none())
}

fn fill_unknown(item: &mut ContentSummary, reader: &mut FieldReader<'_>) -> bool {
    let mut changed = false;

    if item.title.is_empty() {
        if let Some(title) = reader.title() {
            item.title = title;
            changed = true;
        }
    }
    if !item.tags_known {
        if let Some(tags) = reader.tags() {
            item.set_tags(tags);
            changed = true;
        }
    }
    if item.minimum_age.is_none() {
        if let Some(age) = reader.age() {
            item.minimum_age = Some(age);
            changed = true;
        }
    }
    if item.is_video() && item.resolution.is_none() {
        if let Some(resolution) = reader.resolution() {
            item.set_resolution(Some(resolution));
            changed = true;
        }
    }

    changed
}
