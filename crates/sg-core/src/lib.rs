//! StatGuard core: adapter, guardian, and test engine.
//!
//! A request flows adapter → guardian → engine → canonical result. The
//! adapter turns loosely-named caller parameters into a canonical request,
//! the guardian validates test assumptions against the data before any
//! statistic is computed, and the engine evaluates the test at the
//! configured decimal precision.
//!
//! Everything is a pure function over its own request: the only cross-call
//! state is the static alias tables and the thread-local precision stack,
//! so independent calls can run fully in parallel.

pub mod adapter;
pub mod engine;
pub mod guardian;
pub mod model;

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use sg_common::{CanonicalResult, Error, Result};

/// Resolve parameters and execute one test.
pub fn run(test: &str, params: &BTreeMap<String, Value>) -> Result<CanonicalResult> {
    let request = adapter::build_request(test, params)?;
    engine::execute(&request)
}

#[derive(Deserialize)]
struct Envelope {
    test: String,
    #[serde(default)]
    parameters: BTreeMap<String, Value>,
}

/// Execute a test from a JSON envelope: `{"test": "...", "parameters": {...}}`.
///
/// Numeric literals in the payload are preserved at full precision; they
/// never pass through a native float.
pub fn run_json(payload: &str) -> Result<CanonicalResult> {
    let envelope: Envelope = serde_json::from_str(payload).map_err(|e| Error::Validation {
        field: "request".into(),
        reason: e.to_string(),
    })?;
    run(&envelope.test, &envelope.parameters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_entry_point_round_trip() {
        let payload = r#"{
            "test": "one_sample_t_test",
            "parameters": {
                "sample_a": [1, 2, 3, 4, 5],
                "mu": 2
            }
        }"#;
        let result = run_json(payload).unwrap();
        assert_eq!(result.test, "one_sample_t_test");
        assert!(!result.p_value.is_empty());
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = run_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
