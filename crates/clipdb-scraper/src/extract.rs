//! Candidate-path field lookup over loosely structured JSON.
//!
//! A candidate is a key (`"playCount"`) or a dotted path
//! (`"videoMeta.coverUrl"`). Numeric segments index into arrays, so
//! `"thumbnails.0.url"` reads the first thumbnail. Absent keys, out-of-range
//! indexes, and JSON `null` all resolve to `None`; nothing here fails.

use serde_json::Value;

/// Resolves one dotted `path` inside `item`.
#[must_use]
pub fn resolve<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    (!current.is_null()).then_some(current)
}

/// Returns the first candidate that resolves to a non-null value.
#[must_use]
pub fn extract<'a>(item: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates.iter().find_map(|path| resolve(item, path))
}

/// Returns the first candidate whose value `convert` accepts.
///
/// Unlike [`extract`], a present-but-unusable value (say a count delivered
/// as `"n/a"`) does not stop the search.
pub fn extract_map<'a, T>(
    item: &'a Value,
    candidates: &[&str],
    convert: impl Fn(&'a Value) -> Option<T>,
) -> Option<T> {
    candidates
        .iter()
        .filter_map(|path| resolve(item, path))
        .find_map(convert)
}

/// First non-blank string. Numbers are rendered as strings, so numeric ids
/// come back as their decimal form.
#[must_use]
pub fn extract_string(item: &Value, candidates: &[&str]) -> Option<String> {
    extract_map(item, candidates, as_string)
}

/// First value readable as a non-negative count.
#[must_use]
pub fn extract_count(item: &Value, candidates: &[&str]) -> Option<u64> {
    extract_map(item, candidates, as_count)
}

pub(crate) fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads integers, non-negative floats, and strings such as `"1,234"`,
/// `"1.2K"`, `"3M"` or `"2B"`.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => parse_count_str(s),
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn parse_count_str(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let (number, multiplier) = match cleaned.chars().last()?.to_ascii_uppercase() {
        'K' => (&cleaned[..cleaned.len() - 1], 1_000.0),
        'M' => (&cleaned[..cleaned.len() - 1], 1_000_000.0),
        'B' => (&cleaned[..cleaned.len() - 1], 1_000_000_000.0),
        _ => (cleaned.as_str(), 1.0),
    };

    if multiplier > 1.0 || number.contains('.') {
        let parsed = number.parse::<f64>().ok()?;
        if !parsed.is_finite() || parsed < 0.0 {
            return None;
        }
        return Some((parsed * multiplier).round() as u64);
    }
    number.parse::<u64>().ok()
}
