//! Staleness gate on the source fetch timestamp.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use e2n_core::Profile;

use crate::error::ConvertError;

pub const STALE_MESSAGE: &str =
    "source data is stale; re-run with --include-stale if this is intended";

/// Outcome of the staleness gate, mirrored into `stale`/`last_seen` metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Unknown,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fresh => "false",
            Self::Stale => "true",
            Self::Unknown => "unknown",
        }
    }
}

/// Parse ISO-8601 (with or without offset, or a bare date) or RFC 2822.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    DateTime::parse_from_rfc2822(raw).ok().map(|dt| dt.with_timezone(&Utc))
}

/// First timestamp candidate: `fetched_at`, provenance `fetched_at`,
/// `http_date`, `commit_date`.
fn fetch_timestamp(profile: &Profile) -> (Option<String>, Option<DateTime<Utc>>) {
    let provenance = profile
        .meta("source_provenance")
        .and_then(|raw| serde_json::from_str::<serde_json::Value>(raw).ok())
        .and_then(|v| v.get("fetched_at").and_then(|f| f.as_str()).map(str::to_string));

    let candidates = [
        profile.meta("fetched_at").map(str::to_string),
        provenance,
        profile.meta("http_date").map(str::to_string),
        profile.meta("commit_date").map(str::to_string),
    ];
    let first_raw = candidates.iter().flatten().find(|c| !c.trim().is_empty()).cloned();
    for candidate in candidates.iter().flatten() {
        if let Some(ts) = parse_timestamp(candidate) {
            return (Some(candidate.clone()), Some(ts));
        }
    }
    (first_raw, None)
}

/// Run the gate against the current time.
pub fn ensure_fresh(
    profile: &mut Profile,
    stale_after_days: i64,
    include_stale: bool,
) -> Result<Freshness, ConvertError> {
    ensure_fresh_at(profile, stale_after_days, include_stale, Utc::now())
}

/// Stamp `last_seen`/`stale` and refuse stale data unless `include_stale`.
pub fn ensure_fresh_at(
    profile: &mut Profile,
    stale_after_days: i64,
    include_stale: bool,
    now: DateTime<Utc>,
) -> Result<Freshness, ConvertError> {
    let (raw, parsed) = fetch_timestamp(profile);
    let Some(fetched) = parsed else {
        if profile.meta("last_seen").is_none() {
            profile.set_meta("last_seen", raw.unwrap_or_else(|| "unknown".into()));
        }
        if profile.meta("stale").is_none() {
            profile.set_meta("stale", Freshness::Unknown.as_str());
        }
        log::debug!("no parseable fetch timestamp; staleness unknown");
        return Ok(Freshness::Unknown);
    };

    profile.set_meta("last_seen", fetched.to_rfc3339());
    let age = now.signed_duration_since(fetched);
    if age.num_days() > stale_after_days {
        profile.set_meta("stale", Freshness::Stale.as_str());
        log::warn!(
            "source data last fetched {} days ago (threshold {} days)",
            age.num_days(),
            stale_after_days
        );
        if !include_stale {
            return Err(ConvertError::Stale(STALE_MESSAGE.into()));
        }
        return Ok(Freshness::Stale);
    }
    profile.set_meta("stale", Freshness::Fresh.as_str());
    Ok(Freshness::Fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn profile_fetched(days_ago: i64) -> Profile {
        let mut profile = Profile::new();
        profile.set_meta("fetched_at", (now() - Duration::days(days_ago)).to_rfc3339());
        profile
    }

    #[test]
    fn test_parse_formats() {
        assert!(parse_timestamp("2025-01-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2025-01-01T10:00:00+02:00").is_some());
        assert!(parse_timestamp("2025-01-01T10:00:00").is_some());
        assert!(parse_timestamp("2025-01-01").is_some());
        assert!(parse_timestamp("Wed, 01 Jan 2025 10:00:00 GMT").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_stale_profile_aborts() {
        let mut profile = profile_fetched(200);
        let err = ensure_fresh_at(&mut profile, 120, false, now()).unwrap_err();
        assert!(matches!(err, ConvertError::Stale(_)));
        assert!(err.to_string().contains("stale"));
    }

    #[test]
    fn test_include_stale_marks_profile() {
        let mut profile = profile_fetched(200);
        let freshness = ensure_fresh_at(&mut profile, 120, true, now()).unwrap();
        assert_eq!(freshness, Freshness::Stale);
        assert_eq!(profile.meta("stale"), Some("true"));
    }

    #[test]
    fn test_fresh_profile() {
        let mut profile = profile_fetched(3);
        assert_eq!(ensure_fresh_at(&mut profile, 120, false, now()).unwrap(), Freshness::Fresh);
        assert_eq!(profile.meta("stale"), Some("false"));
        assert!(profile.meta("last_seen").unwrap().starts_with("2025-05-29"));
    }

    #[test]
    fn test_provenance_and_http_date_fallbacks() {
        let mut profile = Profile::new();
        profile.set_meta("source_provenance", r#"{"fetched_at":"2025-05-30T00:00:00Z"}"#);
        assert_eq!(ensure_fresh_at(&mut profile, 120, false, now()).unwrap(), Freshness::Fresh);

        let mut profile = Profile::new();
        profile.set_meta("http_date", "Mon, 02 Sep 2024 08:00:00 GMT");
        assert!(ensure_fresh_at(&mut profile, 120, false, now()).is_err());
    }

    #[test]
    fn test_unknown_timestamp() {
        let mut profile = Profile::new();
        profile.set_meta("fetched_at", "sometime");
        assert_eq!(ensure_fresh_at(&mut profile, 120, false, now()).unwrap(), Freshness::Unknown);
        assert_eq!(profile.meta("stale"), Some("unknown"));
        assert_eq!(profile.meta("last_seen"), Some("sometime"));

        let mut profile = Profile::new();
        ensure_fresh_at(&mut profile, 120, false, now()).unwrap();
        assert_eq!(profile.meta("last_seen"), Some("unknown"));
    }
}
