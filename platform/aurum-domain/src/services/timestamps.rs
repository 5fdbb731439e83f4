use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const NAIVE_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Upstream `updatedAt` layouts seen across deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampLayout {
    /// RFC3339 with any fractional precision, e.g. `2024-01-01T10:00:00.123456789Z`.
    Rfc3339,
    /// `Y-M-DTH:M:S.ffffff` without zone, interpreted as UTC.
    NaiveMicros,
    /// RFC3339 first, then the naive layout.
    #[default]
    Auto,
}

impl TimestampLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampLayout::Rfc3339 => "rfc3339",
            TimestampLayout::NaiveMicros => "naive_micros",
            TimestampLayout::Auto => "auto",
        }
    }
}

/// Timestamp stored when an upstream value cannot be parsed (Unix epoch).
pub fn sentinel_observed_at() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

pub fn parse_observed_at(raw: &str, layout: TimestampLayout) -> Result<DateTime<Utc>, String> {
    let value = raw.trim();
    match layout {
        TimestampLayout::Rfc3339 => parse_rfc3339(value),
        TimestampLayout::NaiveMicros => parse_naive(value),
        TimestampLayout::Auto => parse_rfc3339(value).or_else(|_| parse_naive(value)),
    }
    .map_err(|_| format!("unsupported timestamp '{raw}' for layout {}", layout.as_str()))
}

/// Parses `raw`, falling back to [`sentinel_observed_at`]. The flag is `true`
/// when the fallback was used.
pub fn normalize_observed_at(raw: &str, layout: TimestampLayout) -> (DateTime<Utc>, bool) {
    match parse_observed_at(raw, layout) {
        Ok(ts) => (ts, false),
        Err(_) => (sentinel_observed_at(), true),
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc))
}

fn parse_naive(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, NAIVE_LAYOUT).map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::{normalize_observed_at, parse_observed_at, sentinel_observed_at, TimestampLayout};
    use chrono::{TimeZone, Timelike, Utc};

    #[test]
    fn rfc3339_accepts_nanoseconds_and_offsets() {
        let ts = parse_observed_at("2024-01-01T10:00:00.123456789Z", TimestampLayout::Rfc3339)
            .unwrap();
        assert_eq!(ts.nanosecond(), 123_456_789);

        let ts = parse_observed_at("2024-01-01T13:00:00+03:00", TimestampLayout::Rfc3339).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn naive_layout_is_read_as_utc() {
        let ts =
            parse_observed_at("2024-01-01T10:00:00.250000", TimestampLayout::NaiveMicros).unwrap();
        assert_eq!(ts.hour(), 10);
        assert_eq!(ts.nanosecond(), 250_000_000);

        let ts = parse_observed_at("2024-01-01T10:00:00", TimestampLayout::NaiveMicros).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn strict_layouts_reject_the_other_form() {
        assert!(parse_observed_at("2024-01-01T10:00:00.5", TimestampLayout::Rfc3339).is_err());
        assert!(parse_observed_at("2024-01-01T10:00:00Z", TimestampLayout::NaiveMicros).is_err());
    }

    #[test]
    fn auto_layout_accepts_both_forms() {
        let a = parse_observed_at("2024-01-01T10:00:00Z", TimestampLayout::Auto).unwrap();
        let b = parse_observed_at("2024-01-01T10:00:00.000000", TimestampLayout::Auto).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unparseable_values_degrade_to_sentinel() {
        let (ts, fallback) = normalize_observed_at("yesterday", TimestampLayout::Auto);
        assert!(fallback);
        assert_eq!(ts, sentinel_observed_at());
        assert_eq!(ts.timestamp(), 0);

        let (_, fallback) = normalize_observed_at("2024-01-01T10:00:00Z", TimestampLayout::Auto);
        assert!(!fallback);
    }
}
