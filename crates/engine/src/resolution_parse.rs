// ABOUTME: Video resolution coercion from heights, labels and marketing names.
// ABOUTME: Known heights map to Hd/FullHd/Uhd; anything else is kept as Resolution::Other.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::models::Resolution;

static DIMENSIONS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*[x×]\s*(\d+)").expect("dimension pattern is valid")
});

/// Maps a pixel height onto the closed resolution set.
pub fn resolution_from_height(height: u64) -> Resolution {
    match height {
        2160 => Resolution::Uhd,
        1080 => Resolution::FullHd,
        720 => Resolution::Hd,
        n => Resolution::Other(format!("{}p", n)),
    }
}

/// Parses a resolution value.
/// Supports:
/// - JSON numbers (treated as a pixel height)
/// - Height strings with any decoration ("1080", "1080p", "1080 px")
/// - Dimension strings ("1920x1080"), using the height
/// - Keywords: "4k"/"uhd", "full hd", "hd" (case-insensitive)
///
/// Unrecognized non-numeric text is preserved verbatim as `Other`.
/// Returns None for empty input or non-scalar shapes.
pub fn coerce_resolution(value: &Value) -> Option<Resolution> {
    match value {
        Value::Number(n) => {
            if let Some(h) = n.as_u64() {
                return Some(resolution_from_height(h));
            }
            let f = n.as_f64()?;
            if f > 0.0 && f.fract() == 0.0 {
                return Some(resolution_from_height(f as u64));
            }
            None
        }
        Value::String(s) => coerce_resolution_str(s),
        _ => None,
    }
}

/// String form of [`coerce_resolution`].
pub fn coerce_resolution_str(s: &str) -> Option<Resolution> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();

    // "4k" has to win before digit stripping turns it into "4p"
    if lower.contains("4k") || lower.contains("uhd") {
        return Some(Resolution::Uhd);
    }

    if let Some(caps) = DIMENSIONS.captures(&lower) {
        if let Ok(height) = caps[2].parse::<u64>() {
            return Some(resolution_from_height(height));
        }
    }

    let digits: String = lower.chars().filter(|c| c.is_ascii_digit()).collect();
    if !digits.is_empty() {
        return Some(match digits.parse::<u64>() {
            Ok(height) => resolution_from_height(height),
            Err(_) => Resolution::Other(trimmed.to_string()),
        });
    }

    if lower.contains("full hd") || lower.contains("fullhd") {
        return Some(Resolution::FullHd);
    }
    if lower.contains("hd") {
        return Some(Resolution::Hd);
    }

    Some(Resolution::Other(trimmed.to_string()))
}
