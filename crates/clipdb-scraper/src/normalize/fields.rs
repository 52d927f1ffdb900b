//! Scalar parsers shared by the platform schemas.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;

static ISO_DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("valid duration regex")
});

/// Epoch values at or above this are milliseconds (Sep 2001 in ms, year
/// 33658 in seconds).
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Reads an ISO-8601 string, a naive date or datetime, or a Unix epoch in
/// seconds or milliseconds. The unit of an epoch is decided by magnitude.
#[must_use]
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(truncate_f64))
            .and_then(from_epoch),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_f64(f: f64) -> i64 {
    f as i64
}

fn from_epoch(raw: i64) -> Option<DateTime<Utc>> {
    if raw <= 0 {
        return None;
    }
    if raw >= MILLIS_THRESHOLD {
        Utc.timestamp_millis_opt(raw).single()
    } else {
        Utc.timestamp_opt(raw, 0).single()
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    s.parse::<i64>().ok().and_then(from_epoch)
}

/// Reads a duration in seconds from a number, a seconds string,
/// `MM:SS`, `HH:MM:SS`, or an ISO-8601 duration such as `PT1M30S`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_duration(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && *f <= f64::from(u32::MAX))
            .map(|f| f.round() as u32),
        Value::String(s) => parse_duration_str(s.trim()),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_duration_str(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = ISO_DURATION_RE.captures(s) {
        if caps.iter().skip(1).all(|m| m.is_none()) {
            return None;
        }
        let part = |i: usize| -> f64 {
            caps.get(i)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let total = part(1) * 86_400.0 + part(2) * 3_600.0 + part(3) * 60.0 + part(4);
        return (total <= f64::from(u32::MAX)).then(|| total.round() as u32);
    }

    if s.contains(':') {
        let parts: Vec<u32> = s
            .split(':')
            .map(|p| p.trim().parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;
        return match parts.as_slice() {
            [m, sec] => m.checked_mul(60)?.checked_add(*sec),
            [h, m, sec] => h
                .checked_mul(3_600)?
                .checked_add(m.checked_mul(60)?)?
                .checked_add(*sec),
            _ => None,
        };
    }

    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0 && *f <= f64::from(u32::MAX))
        .map(|f| f.round() as u32)
}

/// Keeps absolute `http(s)` URLs, and prefixes anything else with `origin`
/// as a platform-relative path. Protocol-relative `//host/...` gets `https:`.
#[must_use]
pub fn absolutize_url(raw: &str, origin: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(trimmed.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    if trimmed.starts_with('/') {
        Some(format!("{origin}{trimmed}"))
    } else {
        Some(format!("{origin}/{trimmed}"))
    }
}

/// Cuts `s` to at most `max` characters, on a character boundary.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
