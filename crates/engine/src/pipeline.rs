// ABOUTME: End-to-end filtering: normalize, plan enrichment, fetch, merge, filter.
// ABOUTME: Special pass-through modes short-circuit the whole pipeline.

use std::fmt;
use std::future::Future;

use serde::Serialize;
use tracing::{info, info_span, Instrument};

use crate::config::EngineConfig;
use crate::enrichment::{fetch_details, merge_detailed, plan_missing, DetailOutcome};
use crate::error::{EngineError, FieldIssue};
use crate::models::{ContentSummary, FilterCriteria};
use crate::normalizer::Normalizer;
use crate::predicate::{evaluate, Verdict};
use crate::raw::RawRecord;
use crate::special_modes::{resolve, SpecialPayload, SpecialResolution, TagAggregate};

/// What a filter call hands back for rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOutcome {
    /// Passing items in their original order.
    pub items: Vec<ContentSummary>,
    /// Ids that needed a detail fetch; callers use this to show a loading state.
    pub enrichment_requested: Vec<String>,
    /// Ids whose detail fetch failed or found nothing.
    pub enrichment_failed: Vec<String>,
    pub issues: Vec<FieldIssue>,
    /// Filled only under the TopTags mode when a payload was supplied.
    pub tag_aggregates: Vec<TagAggregate>,
}

/// Entry point holding the normalizer configuration.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    normalizer: Normalizer,
}

/// Where a call goes after looking at the special mode.
enum Route {
    Done(FilterOutcome),
    Filter { tag_aggregates: Vec<TagAggregate> },
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(config),
        })
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn normalize_batch(&self, raw: &[RawRecord]) -> Vec<ContentSummary> {
        raw.iter().map(|r| self.normalizer.normalize(r)).collect()
    }

    /// Filters without enrichment; unknown required fields fail closed.
    pub fn filter_now(
        &self,
        raw: &[RawRecord],
        criteria: &FilterCriteria,
    ) -> Result<FilterOutcome, EngineError> {
        let span = info_span!("filter", batch = raw.len(), mode = ?criteria.special_mode);
        let _guard = span.enter();

        let tag_aggregates = match self.route(criteria)? {
            Route::Done(outcome) => return Ok(outcome),
            Route::Filter { tag_aggregates } => tag_aggregates,
        };

        let (items, issues) = self.normalize_with_issues(raw);
        let mut outcome = finish(items, criteria, issues);
        outcome.tag_aggregates = tag_aggregates;
        Ok(outcome)
    }

    /// Filters after fetching details for every record that lacks a required field.
    ///
    /// All fetches are issued at once and joined before any filtering happens.
    /// A failed fetch only affects its own record.
    pub async fn filter_with_enrichment<F, Fut, E>(
        &self,
        raw: &[RawRecord],
        criteria: &FilterCriteria,
        fetch: F,
    ) -> Result<FilterOutcome, EngineError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Option<RawRecord>, E>>,
        E: fmt::Display,
    {
        let span = info_span!("filter", batch = raw.len(), mode = ?criteria.special_mode);
        self.run_enriched(raw, criteria, fetch).instrument(span).await
    }

    async fn run_enriched<F, Fut, E>(
        &self,
        raw: &[RawRecord],
        criteria: &FilterCriteria,
        fetch: F,
    ) -> Result<FilterOutcome, EngineError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<Option<RawRecord>, E>>,
        E: fmt::Display,
    {
        let tag_aggregates = match self.route(criteria)? {
            Route::Done(outcome) => return Ok(outcome),
            Route::Filter { tag_aggregates } => tag_aggregates,
        };

        let (items, mut issues) = self.normalize_with_issues(raw);
        let requested = plan_missing(&items, criteria);

        let (items, failed) = if requested.is_empty() {
            (items, Vec::new())
        } else {
            let details = fetch_details(&requested, fetch).await;
            let failed: Vec<String> = requested
                .iter()
                .filter(|id| !matches!(details.get(id.as_str()), Some(DetailOutcome::Fetched(_))))
                .cloned()
                .collect();
            let merged = merge_detailed(items, &details);
            info!(
                requested = requested.len(),
                updated = merged.stats.items_updated,
                failed = failed.len(),
                "enrichment joined"
            );
            issues.extend(merged.issues);
            (merged.items, failed)
        };

        let mut outcome = finish(items, criteria, issues);
        outcome.enrichment_requested = requested;
        outcome.enrichment_failed = failed;
        outcome.tag_aggregates = tag_aggregates;
        Ok(outcome)
    }

    fn route(&self, criteria: &FilterCriteria) -> Result<Route, EngineError> {
        let Some(mode) = criteria.special_mode else {
            return Ok(Route::Filter {
                tag_aggregates: Vec::new(),
            });
        };

        let payload = match &criteria.special_payload {
            Some(value) => Some(SpecialPayload::from_value(mode, value)?),
            None if mode.is_passthrough() => {
                return Err(EngineError::invalid_input(format!(
                    "special mode {:?} needs a payload",
                    mode
                )))
            }
            None => None,
        };

        match payload.map(|p| resolve(mode, p, &self.normalizer)).transpose()? {
            Some(SpecialResolution::Contents(items)) => {
                info!(items = items.len(), "special mode passthrough");
                Ok(Route::Done(FilterOutcome {
                    items,
                    ..FilterOutcome::default()
                }))
            }
            Some(SpecialResolution::Tags(tag_aggregates)) => Ok(Route::Filter { tag_aggregates }),
            None => Ok(Route::Filter {
                tag_aggregates: Vec::new(),
            }),
        }
    }

    fn normalize_with_issues(&self, raw: &[RawRecord]) -> (Vec<ContentSummary>, Vec<FieldIssue>) {
        let mut issues = Vec::new();
        let items = raw
            .iter()
            .map(|r| {
                let normalized = self.normalizer.normalize_detailed(r);
                issues.extend(normalized.issues);
                normalized.summary
            })
            .collect();
        (items, issues)
    }
}

/// Applies the predicate, recording why unknown fields excluded an item.
fn finish(
    items: Vec<ContentSummary>,
    criteria: &FilterCriteria,
    mut issues: Vec<FieldIssue>,
) -> FilterOutcome {
    let total = items.len();
    let mut kept = Vec::with_capacity(total);

    for item in items {
        match evaluate(&item, criteria) {
            Verdict::Pass => kept.push(item),
            Verdict::Unknown(dimension) => issues.push(FieldIssue::MissingRequiredForFilter {
                id: item.id,
                dimension,
            }),
            Verdict::Rejected(_) => {}
        }
    }

    info!(total, kept = kept.len(), "filter applied");
    FilterOutcome {
        items: kept,
        issues,
        ..FilterOutcome::default()
    }
}
