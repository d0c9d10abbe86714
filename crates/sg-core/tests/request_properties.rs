//! Property-based tests over the full request pipeline.

use std::collections::BTreeMap;

use proptest::prelude::*;
use serde_json::{json, Value};
use sg_common::Error;
use sg_core::run;
use sg_math::Dec;

fn params(pairs: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Any well-formed two-sample request either yields a p-value in [0, 1]
    /// or a structured degenerate/guardian error, never a panic or NaN-like
    /// output.
    #[test]
    fn welch_p_value_is_a_probability(
        a in prop::collection::vec(-50i64..50, 2..12),
        b in prop::collection::vec(-50i64..50, 2..12),
    ) {
        let p = params(vec![
            ("sample_a", json!(a)),
            ("sample_b", json!(b)),
        ]);
        match run("welch_t_test", &p) {
            Ok(result) => {
                let p_value = Dec::parse(&result.p_value).unwrap();
                prop_assert!(!p_value.is_negative());
                prop_assert!(p_value <= Dec::one());
            }
            Err(Error::DegenerateInput { .. }) | Err(Error::GuardianBlocked { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    /// The canonical name always beats aliases, whatever the values.
    #[test]
    fn canonical_mean_always_wins(mu in -100i64..100, canonical in -100i64..100) {
        let p = params(vec![
            ("sample_a", json!([1, 5, 9, 13, 17, 21])),
            ("mu", json!(mu)),
            ("hypothesized_mean", json!(canonical)),
        ]);
        let request = sg_core::adapter::build_request("one_sample_t_test", &p).unwrap();
        match request {
            sg_core::model::CanonicalRequest::TTest {
                kind: sg_core::model::TTestKind::OneSample { hypothesized_mean, .. },
                ..
            } => prop_assert_eq!(hypothesized_mean, Dec::from_int(canonical)),
            other => prop_assert!(false, "unexpected request {other:?}"),
        }
    }

    /// Delimited-string and array payloads resolve to the same result.
    #[test]
    fn string_and_array_payloads_agree(
        values in prop::collection::vec(-30i64..30, 3..10),
        mu in -10i64..10,
    ) {
        prop_assume!(values.iter().any(|v| *v != values[0]));
        let as_string = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let from_array = run(
            "one_sample_t_test",
            &params(vec![
                ("sample_a", json!(values)),
                ("hypothesized_mean", json!(mu)),
            ]),
        );
        let from_string = run(
            "one_sample_t_test",
            &params(vec![
                ("sample_a", json!(as_string)),
                ("hypothesized_mean", json!(mu)),
            ]),
        );
        match (from_array, from_string) {
            (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "payload forms diverged: {a:?} vs {b:?}"),
        }
    }

    /// Exact binomial p-values are probabilities for arbitrary counts.
    #[test]
    fn binomial_exact_tail_bounds(successes in 0u64..30, extra in 0u64..30) {
        let trials = successes + extra;
        prop_assume!(trials > 0);
        let p = params(vec![
            ("successes", json!(successes)),
            ("trials", json!(trials)),
        ]);
        let result = run("binomial_test", &p).unwrap();
        let p_value = Dec::parse(&result.p_value).unwrap();
        prop_assert!(!p_value.is_negative());
        prop_assert!(p_value <= Dec::one());
    }
}
