// ABOUTME: Tag list coercion from arrays or comma-separated strings.
// ABOUTME: Returns None for unrecognized shapes so callers keep tags unknown rather than empty.

use serde_json::Value;

/// Parses a tag list.
/// Supports:
/// - Arrays: string elements are kept, integers are stringified, other elements skipped
/// - A single comma-separated string ("rock, pop")
///
/// Entries are trimmed and empty entries dropped. Case is left alone;
/// the normalizer lower-cases. Returns None for any other shape.
pub fn coerce_tags(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
                    _ => None,
                })
                .filter(|t| !t.is_empty())
                .collect(),
        ),
        Value::String(s) => Some(split_tags(s)),
        _ => None,
    }
}

fn split_tags(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_comma_separated() {
        assert_eq!(
            coerce_tags(&json!("rock, pop,, indie ")),
            Some(vec!["rock".to_string(), "pop".into(), "indie".into()])
        );
    }

    #[test]
    fn test_array() {
        assert_eq!(
            coerce_tags(&json!(["Jazz", " ", 1999, {"name": "x"}])),
            Some(vec!["Jazz".to_string(), "1999".into()])
        );
    }

    #[test]
    fn test_empty_is_known_not_unknown() {
        assert_eq!(coerce_tags(&json!("")), Some(vec![]));
        assert_eq!(coerce_tags(&json!([])), Some(vec![]));
    }

    #[test]
    fn test_other_shapes_are_unknown() {
        assert!(coerce_tags(&json!({"tags": ["a"]})).is_none());
        assert!(coerce_tags(&json!(5)).is_none());
        assert!(coerce_tags(&json!(true)).is_none());
    }
}
