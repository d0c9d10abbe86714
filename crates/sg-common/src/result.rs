//! Canonical result shape emitted by the test engine.
//!
//! Every numeric field is an exact decimal string produced by the result
//! formatter. Maps are `BTreeMap` so serialized output is deterministic.

use crate::report::GuardianOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of one statistical test at the configured precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    /// Canonical test identifier, e.g. "welch_t_test".
    pub test: String,

    /// Test statistics by name ("t", "df", "f", "u", "chi_square", ...).
    pub statistics: BTreeMap<String, String>,

    /// P-value for the requested alternative hypothesis. Empty for analyses
    /// that do not test a hypothesis (power analysis).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub p_value: String,

    /// Confidence interval bounds, when the test defines one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<(String, String)>,

    /// Effect sizes by name ("cohen_d", "eta_squared", "r", ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effect_sizes: BTreeMap<String, String>,

    /// Diagnostic values (group means, coefficients, expected counts, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub diagnostics: BTreeMap<String, String>,

    /// The guardian outcome that gated this result.
    pub guardian: GuardianOutcome,
}

impl CanonicalResult {
    /// Create an empty result shell for a test.
    pub fn new(test: impl Into<String>, guardian: GuardianOutcome) -> Self {
        CanonicalResult {
            test: test.into(),
            statistics: BTreeMap::new(),
            p_value: String::new(),
            confidence_interval: None,
            effect_sizes: BTreeMap::new(),
            diagnostics: BTreeMap::new(),
            guardian,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_is_deterministic() {
        let mut result = CanonicalResult::new("one_sample_t", GuardianOutcome::Skipped);
        result.statistics.insert("t".into(), "2.5".into());
        result.statistics.insert("df".into(), "9".into());
        result.p_value = "0.03".into();

        let a = serde_json::to_string(&result).unwrap();
        let b = serde_json::to_string(&result).unwrap();
        assert_eq!(a, b);
        // BTreeMap keys come out sorted.
        assert!(a.find(r#""df""#).unwrap() < a.find(r#""t""#).unwrap());
    }
}
