// ABOUTME: Canonical types shared by every stage of the engine.
// ABOUTME: ContentSummary is the normalized record; FilterCriteria describes one filter evaluation.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::resolution_parse::coerce_resolution_str;

/// Whether an item is audio or video. Never a free-form string after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Audio,
    /// Absent or ambiguous type hints land here.
    #[default]
    Video,
}

/// Minimum viewing age of an item.
///
/// `Restricted` keeps intermediate ages (1..=17) that the source data carries.
/// They count as known, but neither filter constraint accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeRating {
    AllAges,
    Restricted(u8),
    Over18,
}

/// Video resolution, keyed by height for the well-known cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Resolution {
    Hd,
    FullHd,
    Uhd,
    Other(String),
}

impl Resolution {
    pub fn label(&self) -> &str {
        match self {
            Resolution::Hd => "720p",
            Resolution::FullHd => "1080p",
            Resolution::Uhd => "2160p",
            Resolution::Other(s) => s,
        }
    }
}

impl Resolution {
    /// Equality for filtering: `Other` labels compare case-insensitively.
    pub fn same_as(&self, other: &Resolution) -> bool {
        match (self, other) {
            (Resolution::Other(a), Resolution::Other(b)) => a.to_lowercase() == b.to_lowercase(),
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        match r {
            Resolution::Other(s) => s,
            known => known.label().to_string(),
        }
    }
}

impl From<String> for Resolution {
    fn from(s: String) -> Self {
        coerce_resolution_str(&s).unwrap_or(Resolution::Other(s))
    }
}

impl From<&str> for Resolution {
    fn from(s: &str) -> Self {
        Resolution::from(s.to_string())
    }
}

/// Canonical in-memory representation of one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSummary {
    pub id: String,
    pub title: String,
    pub kind: ContentKind,
    pub is_premium_only: bool,
    /// Lower-cased and de-duplicated. Only meaningful when `tags_known` is true.
    pub tags: BTreeSet<String>,
    /// `None` means not yet known, not "all ages".
    pub minimum_age: Option<AgeRating>,
    /// Always `None` for audio.
    pub resolution: Option<Resolution>,
    pub tags_known: bool,
}

impl ContentSummary {
    /// An item with nothing resolved beyond its identity.
    pub fn new(id: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            kind,
            is_premium_only: false,
            tags: BTreeSet::new(),
            minimum_age: None,
            resolution: None,
            tags_known: false,
        }
    }

    pub fn is_video(&self) -> bool {
        self.kind == ContentKind::Video
    }

    /// Replaces the tag set and marks tags as known.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self.tags_known = true;
    }

    /// Sets the resolution unless the item is audio.
    pub fn set_resolution(&mut self, resolution: Option<Resolution>) {
        self.resolution = if self.is_video() { resolution } else { None };
    }
}

/// Lower-cases, trims and de-duplicates tags, dropping empty entries.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Canonical fields the normalizer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Title,
    Kind,
    Premium,
    Tags,
    Age,
    Resolution,
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CanonicalField::Id => "id",
            CanonicalField::Title => "title",
            CanonicalField::Kind => "kind",
            CanonicalField::Premium => "premium",
            CanonicalField::Tags => "tags",
            CanonicalField::Age => "age",
            CanonicalField::Resolution => "resolution",
        };
        write!(f, "{}", s)
    }
}

/// The four filter dimensions, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Tags,
    Subscription,
    Age,
    Resolution,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dimension::Tags => "tags",
            Dimension::Subscription => "subscription",
            Dimension::Age => "age",
            Dimension::Resolution => "resolution",
        };
        write!(f, "{}", s)
    }
}

/// Subscription gate requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subscription {
    #[default]
    Any,
    VipOnly,
    StandardOnly,
}

/// Age constraint requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeFilter {
    AllAges,
    Over18,
}

/// Aggregate display modes that alter or bypass filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialMode {
    TopTags,
    TopContents,
    TopRated,
}

impl SpecialMode {
    /// Modes that return their payload as-is without touching the predicate evaluator.
    pub fn is_passthrough(self) -> bool {
        matches!(self, SpecialMode::TopContents | SpecialMode::TopRated)
    }
}

/// Immutable description of one filter evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Empty means no constraint; otherwise every tag must be present.
    #[serde(deserialize_with = "deserialize_tags")]
    pub tags: BTreeSet<String>,
    pub subscription: Subscription,
    pub age: Option<AgeFilter>,
    /// Empty means no constraint; otherwise only video at one of these resolutions matches.
    pub resolutions: BTreeSet<Resolution>,
    pub special_mode: Option<SpecialMode>,
    /// Opaque pre-fetched result set for the special mode.
    pub special_payload: Option<Value>,
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(normalize_tags(raw))
}

impl FilterCriteria {
    pub fn builder() -> CriteriaBuilder {
        CriteriaBuilder::default()
    }

    /// True when no tag, subscription, age or resolution constraint is active.
    pub fn is_unconstrained(&self) -> bool {
        self.tags.is_empty()
            && self.subscription == Subscription::Any
            && self.age.is_none()
            && self.resolutions.is_empty()
    }
}

/// Fluent construction of [`FilterCriteria`]; the result is never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct CriteriaBuilder {
    criteria: FilterCriteria,
}

impl CriteriaBuilder {
    /// Require a tag (case-insensitive).
    pub fn tag(mut self, tag: impl AsRef<str>) -> Self {
        self.criteria.tags.extend(normalize_tags([tag]));
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.criteria.tags.extend(normalize_tags(tags));
        self
    }

    pub fn subscription(mut self, subscription: Subscription) -> Self {
        self.criteria.subscription = subscription;
        self
    }

    pub fn age(mut self, age: AgeFilter) -> Self {
        self.criteria.age = Some(age);
        self
    }

    /// Accept one more resolution.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.criteria.resolutions.insert(resolution);
        self
    }

    pub fn special_mode(mut self, mode: SpecialMode) -> Self {
        self.criteria.special_mode = Some(mode);
        self
    }

    pub fn special_payload(mut self, payload: Value) -> Self {
        self.criteria.special_payload = Some(payload);
        self
    }

    pub fn build(self) -> FilterCriteria {
        self.criteria
    }
}
