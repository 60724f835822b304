// ABOUTME: Minimum-age coercion from the numeric and string forms upstream uses.
// ABOUTME: "TP" and 0 mean all ages; 18 and above mean adults only.

use serde_json::Value;

use crate::models::AgeRating;

/// Token upstream uses for "todos los públicos".
const ALL_AGES_TOKEN: &str = "TP";
const ADULT_AGE: u64 = 18;

/// Parses a minimum-age value.
/// Supports:
/// - JSON numbers (non-negative integers, or floats with no fractional part)
/// - The literal token "TP" (case-insensitive)
/// - Decimal strings, optionally with a trailing "+" ("18+")
///
/// Returns None for anything else.
pub fn coerce_age(value: &Value) -> Option<AgeRating> {
    match value {
        Value::Number(n) => {
            if let Some(age) = n.as_u64() {
                return Some(classify(age));
            }
            let f = n.as_f64()?;
            if f >= 0.0 && f.fract() == 0.0 {
                return Some(classify(f as u64));
            }
            None
        }
        Value::String(s) => coerce_age_str(s),
        _ => None,
    }
}

/// String form of [`coerce_age`].
pub fn coerce_age_str(s: &str) -> Option<AgeRating> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.eq_ignore_ascii_case(ALL_AGES_TOKEN) {
        return Some(AgeRating::AllAges);
    }
    let digits = s.strip_suffix('+').unwrap_or(s).trim_end();
    digits.parse::<u64>().ok().map(classify)
}

fn classify(age: u64) -> AgeRating {
    match age {
        0 => AgeRating::AllAges,
        a if a >= ADULT_AGE => AgeRating::Over18,
        // 1..=17 after the two guards above
        a => AgeRating::Restricted(a as u8),
    }
}
