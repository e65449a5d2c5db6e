// src/params/window.rs

//! Extraction time window.
//!
//! Taps receive `start_at` / `end_at` through the parameter set. By default
//! the window spans one day either side of now; callers can pin it with
//! `reference_time`, or set either bound explicitly.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::errors::{Result, TaplineError};
use crate::params::ParameterSet;

pub const START_AT: &str = "start_at";
pub const END_AT: &str = "end_at";
pub const REFERENCE_TIME: &str = "reference_time";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_at: String,
    pub end_at: String,
}

impl TimeWindow {
    pub fn default_start_offset() -> Duration {
        Duration::days(-1)
    }

    pub fn default_end_offset() -> Duration {
        Duration::days(1)
    }

    /// Window around `reference`.
    pub fn around(reference: DateTime<Utc>, start_offset: Duration, end_offset: Duration) -> Self {
        Self {
            start_at: format_timestamp(reference + start_offset),
            end_at: format_timestamp(reference + end_offset),
        }
    }

    /// Window for a run, honouring any bounds or reference the caller put in
    /// `data`.
    pub fn from_data(data: &ParameterSet, now: DateTime<Utc>) -> Result<Self> {
        let reference = match data.get(REFERENCE_TIME).filter(|s| !s.is_empty()) {
            Some(raw) => parse_timestamp(raw)?,
            None => now,
        };
        let computed = Self::around(
            reference,
            Self::default_start_offset(),
            Self::default_end_offset(),
        );

        Ok(Self {
            start_at: explicit(data, START_AT).unwrap_or(computed.start_at),
            end_at: explicit(data, END_AT).unwrap_or(computed.end_at),
        })
    }

    pub fn apply(&self, params: &mut ParameterSet) {
        params.insert(START_AT, self.start_at.clone());
        params.insert(END_AT, self.end_at.clone());
    }
}

fn explicit(data: &ParameterSet, key: &str) -> Option<String> {
    data.get(key).filter(|s| !s.is_empty()).map(str::to_string)
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }
    Err(TaplineError::ConfigError(format!(
        "invalid {REFERENCE_TIME} '{raw}' (expected RFC 3339 or YYYY-MM-DD)"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn defaults_to_one_day_either_side_of_now() {
        let window = TimeWindow::from_data(&ParameterSet::default(), noon()).unwrap();
        assert_eq!(window.start_at, "2024-03-09T12:00:00Z");
        assert_eq!(window.end_at, "2024-03-11T12:00:00Z");
    }

    #[test]
    fn reference_time_replaces_now() {
        let data = ParameterSet::from_pairs([("reference_time", "2020-01-01")]);
        let window = TimeWindow::from_data(&data, noon()).unwrap();
        assert_eq!(window.start_at, "2019-12-31T00:00:00Z");
        assert_eq!(window.end_at, "2020-01-02T00:00:00Z");
    }

    #[test]
    fn explicit_bounds_are_kept_verbatim() {
        let data = ParameterSet::from_pairs([("start_at", "2021-05-01")]);
        let window = TimeWindow::from_data(&data, noon()).unwrap();
        assert_eq!(window.start_at, "2021-05-01");
        assert_eq!(window.end_at, "2024-03-11T12:00:00Z");
    }

    #[test]
    fn offsets_in_rfc3339_are_normalised_to_utc() {
        let ts = parse_timestamp("2024-03-10T14:00:00+02:00").unwrap();
        assert_eq!(ts, noon());
    }

    #[test]
    fn garbage_reference_is_rejected() {
        let data = ParameterSet::from_pairs([("reference_time", "yesterday")]);
        assert!(TimeWindow::from_data(&data, noon()).is_err());
    }

    #[test]
    fn apply_inserts_both_bounds() {
        let mut params = ParameterSet::default();
        TimeWindow::around(noon(), Duration::hours(-1), Duration::hours(1)).apply(&mut params);
        assert_eq!(params.get("start_at"), Some("2024-03-10T11:00:00Z"));
        assert_eq!(params.get("end_at"), Some("2024-03-10T13:00:00Z"));
    }
}
