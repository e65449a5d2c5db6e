// src/config/env.rs

//! Immutable snapshot of the environment.
//!
//! The process environment is read exactly once, at the CLI boundary. Values
//! loaded later (parameter file, parameter store) are layered on top by
//! building a new snapshot, so nothing in the crate ever calls
//! `std::env::set_var`.

use std::collections::BTreeMap;

use crate::errors::{Result, TaplineError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Non-UTF-8 entries are
    /// skipped.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Return a new snapshot with `overlay` applied on top; overlay wins.
    pub fn with_overlay(&self, overlay: BTreeMap<String, String>) -> Self {
        let mut vars = self.vars.clone();
        vars.extend(overlay);
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Like [`get`](Self::get), but treats an empty value as absent.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| TaplineError::MissingValue(format!("`{key}` is not set")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_wins_and_leaves_original_untouched() {
        let base = EnvSnapshot::from_pairs([("A", "1"), ("B", "2")]);
        let mut overlay = BTreeMap::new();
        overlay.insert("B".to_string(), "20".to_string());
        overlay.insert("C".to_string(), "30".to_string());

        let merged = base.with_overlay(overlay);

        assert_eq!(merged.get("A"), Some("1"));
        assert_eq!(merged.get("B"), Some("20"));
        assert_eq!(merged.get("C"), Some("30"));
        assert_eq!(base.get("B"), Some("2"));
        assert_eq!(base.get("C"), None);
    }

    #[test]
    fn require_reports_missing_key() {
        let env = EnvSnapshot::default();
        let err = env.require("target_config").unwrap_err();
        assert!(matches!(err, TaplineError::MissingValue(ref m) if m.contains("target_config")));
    }

    #[test]
    fn empty_values_are_absent_for_get_non_empty() {
        let env = EnvSnapshot::from_pairs([("catalog", "")]);
        assert_eq!(env.get("catalog"), Some(""));
        assert_eq!(env.get_non_empty("catalog"), None);
    }
}
