// ABOUTME: Decides whether a ContentSummary satisfies a FilterCriteria.
// ABOUTME: Four AND-ed dimensions, fail-closed on unknown fields, with a TopTags relaxation.

use serde::Serialize;

use crate::models::{
    AgeFilter, AgeRating, ContentSummary, Dimension, FilterCriteria, SpecialMode, Subscription,
};

/// Outcome of evaluating one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "dimension", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    /// A known field failed the constraint.
    Rejected(Dimension),
    /// The constraint needs a field that is still unknown.
    Unknown(Dimension),
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }
}

/// Per-dimension check result.
enum Check {
    Pass,
    Fail,
    Unknown,
}

impl Check {
    fn from_bool(ok: bool) -> Self {
        if ok {
            Check::Pass
        } else {
            Check::Fail
        }
    }
}

fn check_tags(item: &ContentSummary, criteria: &FilterCriteria) -> Check {
    if criteria.tags.is_empty() {
        return Check::Pass;
    }
    if !item.tags_known {
        return Check::Unknown;
    }
    Check::from_bool(criteria.tags.is_subset(&item.tags))
}

fn check_subscription(item: &ContentSummary, criteria: &FilterCriteria) -> Check {
    Check::from_bool(match criteria.subscription {
        Subscription::Any => true,
        Subscription::VipOnly => item.is_premium_only,
        Subscription::StandardOnly => !item.is_premium_only,
    })
}

fn check_age(item: &ContentSummary, criteria: &FilterCriteria) -> Check {
    let Some(wanted) = criteria.age else {
        return Check::Pass;
    };
    let Some(actual) = item.minimum_age else {
        return Check::Unknown;
    };
    Check::from_bool(matches!(
        (wanted, actual),
        (AgeFilter::AllAges, AgeRating::AllAges) | (AgeFilter::Over18, AgeRating::Over18)
    ))
}

fn check_resolution(item: &ContentSummary, criteria: &FilterCriteria) -> Check {
    if criteria.resolutions.is_empty() {
        return Check::Pass;
    }
    if !item.is_video() {
        return Check::Fail;
    }
    match &item.resolution {
        Some(r) => Check::from_bool(criteria.resolutions.iter().any(|c| c.same_as(r))),
        None => Check::Unknown,
    }
}

type CheckFn = fn(&ContentSummary, &FilterCriteria) -> Check;

const ALL_CHECKS: &[(Dimension, CheckFn)] = &[
    (Dimension::Tags, check_tags),
    (Dimension::Subscription, check_subscription),
    (Dimension::Age, check_age),
    (Dimension::Resolution, check_resolution),
];

const TOP_TAGS_CHECKS: &[(Dimension, CheckFn)] = &[(Dimension::Tags, check_tags)];

/// Evaluates every active dimension in order and reports the first failure.
///
/// Under [`SpecialMode::TopTags`] only the tag dimension is consulted.
pub fn evaluate(item: &ContentSummary, criteria: &FilterCriteria) -> Verdict {
    let checks = if criteria.special_mode == Some(SpecialMode::TopTags) {
        TOP_TAGS_CHECKS
    } else {
        ALL_CHECKS
    };

    for (dimension, check) in checks {
        match check(item, criteria) {
            Check::Pass => {}
            Check::Fail => return Verdict::Rejected(*dimension),
            Check::Unknown => return Verdict::Unknown(*dimension),
        }
    }
    Verdict::Pass
}

/// True when the item satisfies every active constraint.
pub fn matches(item: &ContentSummary, criteria: &FilterCriteria) -> bool {
    evaluate(item, criteria).is_pass()
}

/// Keeps the passing items in their original order.
pub fn filter_batch(batch: Vec<ContentSummary>, criteria: &FilterCriteria) -> Vec<ContentSummary> {
    batch
        .into_iter()
        .filter(|item| matches(item, criteria))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentKind, Resolution};

    fn video(id: &str) -> ContentSummary {
        let mut item = ContentSummary::new(id, ContentKind::Video);
        item.minimum_age = Some(AgeRating::AllAges);
        item
    }

    #[test]
    fn tags_use_and_semantics() {
        let mut item = video("1");
        item.set_tags(["rock", "indie"]);

        let both = FilterCriteria::builder().tags(["rock", "pop"]).build();
        assert_eq!(evaluate(&item, &both), Verdict::Rejected(Dimension::Tags));

        let one = FilterCriteria::builder().tag("Rock").build();
        assert!(matches(&item, &one));

        assert!(matches(&item, &FilterCriteria::default()));
    }

    #[test]
    fn unknown_tags_fail_only_when_constrained() {
        let item = video("1");
        let criteria = FilterCriteria::builder().tag("rock").build();
        assert_eq!(evaluate(&item, &criteria), Verdict::Unknown(Dimension::Tags));
        assert!(matches(&item, &FilterCriteria::default()));
    }

    #[test]
    fn subscription_gate() {
        let mut vip = video("1");
        vip.is_premium_only = true;
        let standard = video("2");

        let vip_only = FilterCriteria::builder().subscription(Subscription::VipOnly).build();
        let standard_only = FilterCriteria::builder()
            .subscription(Subscription::StandardOnly)
            .build();

        assert!(matches(&vip, &vip_only));
        assert!(!matches(&standard, &vip_only));
        assert!(matches(&standard, &standard_only));
        assert!(!matches(&vip, &standard_only));
    }

    #[test]
    fn unknown_age_fails_closed() {
        let mut item = video("1");
        item.minimum_age = None;

        let all = FilterCriteria::builder().age(AgeFilter::AllAges).build();
        let adult = FilterCriteria::builder().age(AgeFilter::Over18).build();
        assert_eq!(evaluate(&item, &all), Verdict::Unknown(Dimension::Age));
        assert_eq!(evaluate(&item, &adult), Verdict::Unknown(Dimension::Age));
        assert!(matches(&item, &FilterCriteria::default()));
    }

    #[test]
    fn intermediate_age_matches_neither_constraint() {
        let mut item = video("1");
        item.minimum_age = Some(AgeRating::Restricted(17));

        let all = FilterCriteria::builder().age(AgeFilter::AllAges).build();
        let adult = FilterCriteria::builder().age(AgeFilter::Over18).build();
        assert_eq!(evaluate(&item, &all), Verdict::Rejected(Dimension::Age));
        assert_eq!(evaluate(&item, &adult), Verdict::Rejected(Dimension::Age));
    }

    #[test]
    fn resolution_excludes_audio() {
        let mut audio = ContentSummary::new("a", ContentKind::Audio);
        audio.minimum_age = Some(AgeRating::AllAges);
        let criteria = FilterCriteria::builder().resolution(Resolution::FullHd).build();
        assert_eq!(evaluate(&audio, &criteria), Verdict::Rejected(Dimension::Resolution));

        let mut hd = video("v");
        hd.set_resolution(Some(Resolution::FullHd));
        assert!(matches(&hd, &criteria));

        let unknown = video("u");
        assert_eq!(evaluate(&unknown, &criteria), Verdict::Unknown(Dimension::Resolution));
    }

    #[test]
    fn other_resolution_labels_ignore_case() {
        let mut item = video("1");
        item.set_resolution(Some(Resolution::from("cinema scope")));
        let criteria = FilterCriteria::builder()
            .resolution(Resolution::from("Cinema Scope"))
            .build();
        assert!(matches(&item, &criteria));

        let other = FilterCriteria::builder()
            .resolution(Resolution::from("Cinerama"))
            .build();
        assert_eq!(evaluate(&item, &other), Verdict::Rejected(Dimension::Resolution));
    }

    #[test]
    fn top_tags_skips_other_dimensions() {
        let mut item = video("1");
        item.set_tags(["indie"]);
        item.is_premium_only = false;
        item.minimum_age = None;

        let criteria = FilterCriteria::builder()
            .special_mode(SpecialMode::TopTags)
            .tag("indie")
            .subscription(Subscription::VipOnly)
            .age(AgeFilter::Over18)
            .build();
        assert!(matches(&item, &criteria));
    }

    #[test]
    fn filter_batch_is_stable() {
        let mut items = Vec::new();
        for (id, tag) in [("3", "x"), ("1", "y"), ("2", "x")] {
            let mut item = video(id);
            item.set_tags([tag]);
            items.push(item);
        }
        let criteria = FilterCriteria::builder().tag("x").build();
        let ids: Vec<String> = filter_batch(items, &criteria)
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["3", "2"]);
    }
}
