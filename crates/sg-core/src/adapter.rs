//! Parameter adapter: loosely-typed caller fields to canonical requests.
//!
//! Alias resolution is table-driven and family-scoped. The canonical field
//! name always wins; among aliases, the first listed wins. Numeric payloads
//! are parsed from their literal text (`serde_json` keeps arbitrary
//! precision), never through a native float. Unknown fields are ignored.

use std::collections::BTreeMap;

use serde_json::Value;
use sg_common::{Error, Result};
use sg_math::Dec;

use crate::model::{
    Alternative, CanonicalRequest, CategoricalKind, CorrelationMethod, Dataset, NonParametricKind,
    PowerDesign, PowerQuery, TTestKind,
};

// Family-scoped alias tables. Order within each list is the precedence
// order; the canonical name itself is checked first.
const SAMPLE_A_ALIASES: &[&str] = &["data1", "x", "group1"];
const SAMPLE_B_ALIASES: &[&str] = &["data2", "y", "group2"];
const HYPOTHESIZED_MEAN_ALIASES: &[&str] = &["mu", "mean"];
const TEST_TYPE_ALIASES: &[&str] = &["type", "kind"];
const EQUAL_VARIANCE_ALIASES: &[&str] = &["pooled", "var_equal"];
const ALPHA_ALIASES: &[&str] = &["significance_level", "sig_level"];
const ALTERNATIVE_ALIASES: &[&str] = &["tail", "hypothesis"];
const GROUPS_ALIASES: &[&str] = &["data", "samples"];
const RESPONSE_ALIASES: &[&str] = &["y", "dependent", "outcome"];
const PREDICTORS_ALIASES: &[&str] = &["X", "x", "independent"];
const DEGREE_ALIASES: &[&str] = &["degree"];
const METHOD_ALIASES: &[&str] = &["type"];
const CORR_X_ALIASES: &[&str] = &["sample_a", "data1"];
const CORR_Y_ALIASES: &[&str] = &["sample_b", "data2"];
const BLOCKS_ALIASES: &[&str] = &["data", "matrix"];
const TABLE_ALIASES: &[&str] = &["table", "observed"];
const OBSERVED_ALIASES: &[&str] = &["counts", "frequencies"];
const EXPECTED_ALIASES: &[&str] = &["expected_counts", "probabilities"];
const SUCCESSES_ALIASES: &[&str] = &["k", "x"];
const TRIALS_ALIASES: &[&str] = &["n"];
const PROBABILITY_ALIASES: &[&str] = &["p", "hypothesized_probability"];
const EFFECT_SIZE_ALIASES: &[&str] = &["d", "cohens_d"];
const SAMPLE_SIZE_ALIASES: &[&str] = &["n", "n_per_group"];

type Params = BTreeMap<String, Value>;

/// Build the canonical request for `test` from raw caller parameters.
pub fn build_request(test: &str, params: &Params) -> Result<CanonicalRequest> {
    let id = test.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    tracing::debug!(test = %id, "resolving request parameters");
    match id.as_str() {
        "t_test" | "ttest" => build_t_test(params, None),
        "one_sample_t_test" => build_t_test(params, Some("one_sample")),
        "paired_t_test" => build_t_test(params, Some("paired")),
        "two_sample_t_test" | "welch_t_test" | "independent_t_test" => {
            build_t_test(params, Some("two_sample"))
        }
        "pooled_t_test" | "student_t_test" => build_t_test(params, Some("pooled")),
        "anova" | "one_way_anova" => build_anova(params),
        "regression" | "linear_regression" | "multiple_regression" | "polynomial_regression" => {
            build_regression(params)
        }
        "correlation" => build_correlation(params, None),
        "pearson_correlation" => build_correlation(params, Some(CorrelationMethod::Pearson)),
        "spearman_correlation" => build_correlation(params, Some(CorrelationMethod::Spearman)),
        "mann_whitney_u" | "mann_whitney" => {
            let sample_a = require_dataset(params, "sample_a", SAMPLE_A_ALIASES)?;
            let sample_b = require_dataset(params, "sample_b", SAMPLE_B_ALIASES)?;
            Ok(CanonicalRequest::NonParametric {
                kind: NonParametricKind::MannWhitneyU { sample_a, sample_b },
                alternative: alternative(params)?,
            })
        }
        "wilcoxon_signed_rank" | "wilcoxon" => {
            let sample_a = require_dataset(params, "sample_a", SAMPLE_A_ALIASES)?;
            let sample_b = require_dataset(params, "sample_b", SAMPLE_B_ALIASES)?;
            Ok(CanonicalRequest::NonParametric {
                kind: NonParametricKind::WilcoxonSignedRank { sample_a, sample_b },
                alternative: alternative(params)?,
            })
        }
        "kruskal_wallis" => {
            let groups = require_groups(params, "groups", GROUPS_ALIASES)?;
            Ok(CanonicalRequest::NonParametric {
                kind: NonParametricKind::KruskalWallis { groups },
                alternative: Alternative::TwoSided,
            })
        }
        "friedman" => {
            let blocks = require_groups(params, "blocks", BLOCKS_ALIASES)?;
            Ok(CanonicalRequest::NonParametric {
                kind: NonParametricKind::Friedman { blocks },
                alternative: Alternative::TwoSided,
            })
        }
        "chi_square" | "chi_square_independence" => {
            let value = require(params, "contingency_table", TABLE_ALIASES)?;
            let table = parse_table("contingency_table", value)?;
            Ok(CanonicalRequest::Categorical {
                kind: CategoricalKind::ChiSquareIndependence { table },
                alternative: Alternative::TwoSided,
            })
        }
        "chi_square_goodness_of_fit" | "goodness_of_fit" => {
            let observed_value = require(params, "observed", OBSERVED_ALIASES)?;
            let observed = parse_dataset("observed", observed_value)?;
            let expected = match resolve(params, "expected", EXPECTED_ALIASES) {
                Some(v) => Some(parse_dataset("expected", v)?),
                None => None,
            };
            Ok(CanonicalRequest::Categorical {
                kind: CategoricalKind::ChiSquareGoodnessOfFit { observed, expected },
                alternative: Alternative::TwoSided,
            })
        }
        "fisher_exact" => {
            let value = require(params, "contingency_table", TABLE_ALIASES)?;
            let table = parse_count_table_2x2(value)?;
            Ok(CanonicalRequest::Categorical {
                kind: CategoricalKind::FisherExact { table },
                alternative: alternative(params)?,
            })
        }
        "binomial_test" => {
            let successes = parse_count(
                "successes",
                require(params, "successes", SUCCESSES_ALIASES)?,
            )?;
            let trials = parse_count("trials", require(params, "trials", TRIALS_ALIASES)?)?;
            let probability = match resolve(params, "probability", PROBABILITY_ALIASES) {
                Some(v) => parse_dec("probability", v)?,
                None => Dec::parse("0.5").map_err(internal_parse)?,
            };
            Ok(CanonicalRequest::Categorical {
                kind: CategoricalKind::BinomialTest {
                    successes,
                    trials,
                    probability,
                },
                alternative: alternative(params)?,
            })
        }
        "power_analysis" | "power" => build_power(params),
        other => Err(Error::Validation {
            field: "test".into(),
            reason: format!("unknown test `{other}`"),
        }),
    }
}

fn build_t_test(params: &Params, forced: Option<&str>) -> Result<CanonicalRequest> {
    let declared = match resolve(params, "test_type", TEST_TYPE_ALIASES) {
        Some(v) => Some(parse_string("test_type", v)?),
        None => None,
    };
    let shape = match forced {
        Some(s) => s.to_string(),
        None => match declared.as_deref() {
            Some(raw) => match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
                "one_sample" => "one_sample".into(),
                "independent" | "two_sample" | "unpaired" => "two_sample".into(),
                "paired" | "dependent" => "paired".into(),
                other => {
                    return Err(Error::Validation {
                        field: "test_type".into(),
                        reason: format!("unknown t-test type `{other}`"),
                    })
                }
            },
            // Infer the shape from which samples were supplied.
            None => {
                if resolve(params, "sample_b", SAMPLE_B_ALIASES).is_some() {
                    "two_sample".into()
                } else {
                    "one_sample".into()
                }
            }
        },
    };

    let kind = match shape.as_str() {
        "one_sample" => TTestKind::OneSample {
            sample: require_dataset(params, "sample_a", SAMPLE_A_ALIASES)?,
            hypothesized_mean: require_dec(params, "hypothesized_mean", HYPOTHESIZED_MEAN_ALIASES)?,
        },
        "paired" => TTestKind::Paired {
            sample_a: require_dataset(params, "sample_a", SAMPLE_A_ALIASES)?,
            sample_b: require_dataset(params, "sample_b", SAMPLE_B_ALIASES)?,
        },
        shape => TTestKind::TwoSample {
            sample_a: require_dataset(params, "sample_a", SAMPLE_A_ALIASES)?,
            sample_b: require_dataset(params, "sample_b", SAMPLE_B_ALIASES)?,
            pooled: shape == "pooled"
                || match resolve(params, "equal_variance", EQUAL_VARIANCE_ALIASES) {
                    Some(v) => parse_bool("equal_variance", v)?,
                    None => false,
                },
        },
    };
    Ok(CanonicalRequest::TTest {
        kind,
        alpha: alpha(params)?,
        alternative: alternative(params)?,
    })
}

fn build_anova(params: &Params) -> Result<CanonicalRequest> {
    let groups = require_groups(params, "groups", GROUPS_ALIASES)?;
    if groups.len() < 2 {
        return Err(Error::Validation {
            field: "groups".into(),
            reason: format!("ANOVA needs at least 2 groups, got {}", groups.len()),
        });
    }
    Ok(CanonicalRequest::Anova {
        groups,
        alpha: alpha(params)?,
    })
}

fn build_regression(params: &Params) -> Result<CanonicalRequest> {
    let response_value = require(params, "response", RESPONSE_ALIASES)?;
    let response = parse_dataset("response", response_value)?;
    let predictors_value = require(params, "predictors", PREDICTORS_ALIASES)?;
    let mut predictors = parse_columns("predictors", predictors_value)?;

    if let Some(v) = resolve(params, "polynomial_degree", DEGREE_ALIASES) {
        let degree = parse_count("polynomial_degree", v)?;
        if degree == 0 {
            return Err(Error::Validation {
                field: "polynomial_degree".into(),
                reason: "degree must be at least 1".into(),
            });
        }
        if predictors.len() != 1 {
            return Err(Error::Validation {
                field: "polynomial_degree".into(),
                reason: "polynomial expansion requires exactly one predictor".into(),
            });
        }
        let base = predictors.remove(0);
        for power in 1..=degree {
            let column: Option<Vec<Dec>> = base
                .iter()
                .map(|v| v.powi(power as i64))
                .collect();
            predictors.push(column.ok_or(Error::Validation {
                field: "polynomial_degree".into(),
                reason: format!("cannot raise predictor to power {power}"),
            })?);
        }
    }

    Ok(CanonicalRequest::Regression {
        response,
        predictors,
        alpha: alpha(params)?,
    })
}

fn build_correlation(
    params: &Params,
    forced: Option<CorrelationMethod>,
) -> Result<CanonicalRequest> {
    let method = match forced {
        Some(m) => m,
        None => match resolve(params, "method", METHOD_ALIASES) {
            Some(v) => match parse_string("method", v)?.to_ascii_lowercase().as_str() {
                "pearson" => CorrelationMethod::Pearson,
                "spearman" => CorrelationMethod::Spearman,
                other => {
                    return Err(Error::Validation {
                        field: "method".into(),
                        reason: format!("unknown correlation method `{other}`"),
                    })
                }
            },
            None => CorrelationMethod::Pearson,
        },
    };
    Ok(CanonicalRequest::Correlation {
        method,
        x: require_dataset(params, "x", CORR_X_ALIASES)?,
        y: require_dataset(params, "y", CORR_Y_ALIASES)?,
        alternative: alternative(params)?,
    })
}

fn build_power(params: &Params) -> Result<CanonicalRequest> {
    let design = match resolve(params, "test_type", TEST_TYPE_ALIASES) {
        Some(v) => match parse_string("test_type", v)?
            .to_ascii_lowercase()
            .replace(['-', ' '], "_")
            .as_str()
        {
            "one_sample" => PowerDesign::OneSample,
            "two_sample" | "independent" => PowerDesign::TwoSample,
            other => {
                return Err(Error::Validation {
                    field: "test_type".into(),
                    reason: format!("unknown power-analysis design `{other}`"),
                })
            }
        },
        None => PowerDesign::TwoSample,
    };
    let effect_size = require_dec(params, "effect_size", EFFECT_SIZE_ALIASES)?;
    let sample_size = match resolve(params, "sample_size", SAMPLE_SIZE_ALIASES) {
        Some(v) => Some(parse_count("sample_size", v)?),
        None => None,
    };
    let power = match resolve(params, "power", &[]) {
        Some(v) => Some(parse_dec("power", v)?),
        None => None,
    };
    match (&sample_size, &power) {
        (None, None) => {
            return Err(Error::Validation {
                field: "sample_size".into(),
                reason: "supply either sample_size (to solve for power) or power (to solve for sample size)".into(),
            })
        }
        (Some(_), Some(_)) => {
            return Err(Error::Validation {
                field: "power".into(),
                reason: "supply only one of sample_size and power".into(),
            })
        }
        _ => {}
    }
    Ok(CanonicalRequest::PowerAnalysis {
        query: PowerQuery {
            design,
            effect_size,
            sample_size,
            power,
        },
        alpha: alpha(params)?,
        alternative: alternative(params)?,
    })
}

// ---------------------------------------------------------------------------
// Alias resolution
// ---------------------------------------------------------------------------

/// Canonical name first, then aliases in listed order.
fn resolve<'a>(params: &'a Params, canonical: &str, aliases: &[&str]) -> Option<&'a Value> {
    if let Some(v) = params.get(canonical) {
        return Some(v);
    }
    aliases.iter().find_map(|alias| params.get(*alias))
}

fn require<'a>(params: &'a Params, canonical: &str, aliases: &[&str]) -> Result<&'a Value> {
    resolve(params, canonical, aliases).ok_or_else(|| Error::Validation {
        field: canonical.into(),
        reason: "required field missing after alias resolution".into(),
    })
}

fn require_dec(params: &Params, canonical: &str, aliases: &[&str]) -> Result<Dec> {
    parse_dec(canonical, require(params, canonical, aliases)?)
}

fn require_dataset(params: &Params, canonical: &str, aliases: &[&str]) -> Result<Dataset> {
    parse_dataset(canonical, require(params, canonical, aliases)?)
}

fn require_groups(params: &Params, canonical: &str, aliases: &[&str]) -> Result<Vec<Dataset>> {
    parse_columns(canonical, require(params, canonical, aliases)?)
}

fn alpha(params: &Params) -> Result<Dec> {
    let value = match resolve(params, "alpha", ALPHA_ALIASES) {
        Some(v) => parse_dec("alpha", v)?,
        None => Dec::parse("0.05").map_err(internal_parse)?,
    };
    if value.is_zero() || value.is_negative() || value >= Dec::one() {
        return Err(Error::Validation {
            field: "alpha".into(),
            reason: format!("significance level must be in (0, 1), got {value}"),
        });
    }
    Ok(value)
}

fn alternative(params: &Params) -> Result<Alternative> {
    match resolve(params, "alternative", ALTERNATIVE_ALIASES) {
        Some(v) => {
            let raw = parse_string("alternative", v)?;
            Alternative::parse(&raw).ok_or_else(|| Error::Validation {
                field: "alternative".into(),
                reason: format!("unknown alternative `{raw}`"),
            })
        }
        None => Ok(Alternative::TwoSided),
    }
}

// ---------------------------------------------------------------------------
// Value parsing (never through f64)
// ---------------------------------------------------------------------------

fn internal_parse(reason: String) -> Error {
    Error::Validation {
        field: "internal".into(),
        reason,
    }
}

fn parse_dec(field: &str, value: &Value) -> Result<Dec> {
    let text = match value {
        // With arbitrary_precision the number keeps its literal text.
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(Error::Validation {
                field: field.into(),
                reason: format!("expected a number, got {other}"),
            })
        }
    };
    Dec::parse(&text).map_err(|reason| Error::Validation {
        field: field.into(),
        reason,
    })
}

fn parse_string(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(Error::Validation {
            field: field.into(),
            reason: format!("expected a string, got {other}"),
        }),
    }
}

fn parse_bool(field: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            other => Err(Error::Validation {
                field: field.into(),
                reason: format!("expected a boolean, got `{other}`"),
            }),
        },
        other => Err(Error::Validation {
            field: field.into(),
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}

fn parse_count(field: &str, value: &Value) -> Result<u64> {
    let dec = parse_dec(field, value)?;
    let err = || Error::Validation {
        field: field.into(),
        reason: format!("expected a non-negative integer, got {dec}"),
    };
    if dec.is_negative() {
        return Err(err());
    }
    let as_int = dec.to_i64().ok_or_else(err)?;
    u64::try_from(as_int).map_err(|_| err())
}

/// A dataset is an array of scalars, a delimited string, or one scalar.
fn parse_dataset(field: &str, value: &Value) -> Result<Dataset> {
    let data = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| parse_dec(field, item))
            .collect::<Result<Vec<_>>>()?,
        Value::String(s) => s
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|token| !token.is_empty())
            .map(|token| {
                Dec::parse(token).map_err(|reason| Error::Validation {
                    field: field.into(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Value::Number(_) => vec![parse_dec(field, value)?],
        other => {
            return Err(Error::Validation {
                field: field.into(),
                reason: format!("expected a sequence of numbers, got {other}"),
            })
        }
    };
    if data.is_empty() {
        return Err(Error::Validation {
            field: field.into(),
            reason: "sequence is empty".into(),
        });
    }
    Ok(data)
}

/// Nested arrays become grouped datasets; a flat array becomes one group.
fn parse_columns(field: &str, value: &Value) -> Result<Vec<Dataset>> {
    match value {
        Value::Array(items) if items.iter().all(|v| matches!(v, Value::Array(_))) => items
            .iter()
            .map(|item| parse_dataset(field, item))
            .collect(),
        _ => Ok(vec![parse_dataset(field, value)?]),
    }
}

fn parse_table(field: &str, value: &Value) -> Result<Vec<Vec<Dec>>> {
    let rows = parse_columns(field, value)?;
    let width = rows.first().map(Vec::len).unwrap_or(0);
    if rows.len() < 2 || width < 2 || rows.iter().any(|r| r.len() != width) {
        return Err(Error::Validation {
            field: field.into(),
            reason: "contingency table must be rectangular with at least 2 rows and 2 columns"
                .into(),
        });
    }
    Ok(rows)
}

fn parse_count_table_2x2(value: &Value) -> Result<[[u64; 2]; 2]> {
    let rows = parse_table("contingency_table", value)?;
    if rows.len() != 2 || rows[0].len() != 2 {
        return Err(Error::Validation {
            field: "contingency_table".into(),
            reason: "Fisher's exact test requires a 2x2 table".into(),
        });
    }
    let mut out = [[0u64; 2]; 2];
    for (i, row) in rows.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let err = || Error::Validation {
                field: "contingency_table".into(),
                reason: format!("cell ({i},{j}) must be a non-negative integer, got {cell}"),
            };
            if cell.is_negative() {
                return Err(err());
            }
            let as_int = cell.to_i64().ok_or_else(err)?;
            out[i][j] = u64::try_from(as_int).map_err(|_| err())?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn canonical_name_beats_alias() {
        let p = params(&[
            ("sample_a", json!([1, 2, 3, 4])),
            ("mu", json!(10)),
            ("hypothesized_mean", json!(20)),
        ]);
        let req = build_request("t_test", &p).unwrap();
        match req {
            CanonicalRequest::TTest {
                kind: TTestKind::OneSample {
                    hypothesized_mean, ..
                },
                ..
            } => assert_eq!(hypothesized_mean, Dec::from_int(20)),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn first_listed_alias_wins() {
        // data1 is listed before group1 for sample_a.
        let p = params(&[
            ("data1", json!([1, 2, 3])),
            ("group1", json!([7, 8, 9])),
            ("data2", json!([4, 5, 6])),
        ]);
        let req = build_request("welch_t_test", &p).unwrap();
        match req {
            CanonicalRequest::TTest {
                kind: TTestKind::TwoSample { sample_a, .. },
                ..
            } => assert_eq!(sample_a[0], Dec::from_int(1)),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn test_type_value_mapping() {
        let p = params(&[
            ("test_type", json!("independent")),
            ("sample_a", json!([1, 2, 3])),
            ("sample_b", json!([4, 5, 6])),
        ]);
        let req = build_request("t_test", &p).unwrap();
        assert_eq!(req.test_id(), "welch_t_test");

        let p = params(&[
            ("test_type", json!("independent")),
            ("equal_variance", json!(true)),
            ("sample_a", json!([1, 2, 3])),
            ("sample_b", json!([4, 5, 6])),
        ]);
        assert_eq!(build_request("t_test", &p).unwrap().test_id(), "pooled_t_test");
    }

    #[test]
    fn delimited_strings_parse_without_floats() {
        let p = params(&[
            ("sample_a", json!("1.5, 2.25; 3.125\n4")),
            ("hypothesized_mean", json!("2.5")),
        ]);
        let req = build_request("one_sample_t_test", &p).unwrap();
        match req {
            CanonicalRequest::TTest {
                kind: TTestKind::OneSample { sample, .. },
                ..
            } => {
                assert_eq!(sample.len(), 4);
                assert_eq!(sample[2], Dec::parse("3.125").unwrap());
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn high_precision_literals_survive() {
        let literal = "1.00000000000000000000000000000000000000000000000001";
        let payload = format!(r#"{{"sample_a": [{literal}, 2], "hypothesized_mean": 0}}"#);
        let p: Params = serde_json::from_str(&payload).unwrap();
        let req = build_request("one_sample_t_test", &p).unwrap();
        match req {
            CanonicalRequest::TTest {
                kind: TTestKind::OneSample { sample, .. },
                ..
            } => assert_eq!(sample[0], Dec::parse(literal).unwrap()),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let p = params(&[
            ("sample_a", json!([1, 2, 3])),
            ("hypothesized_mean", json!(2)),
            ("favourite_colour", json!("teal")),
        ]);
        assert!(build_request("t_test", &p).is_ok());
    }

    #[test]
    fn missing_required_field_names_the_canonical_field() {
        let p = params(&[("sample_a", json!([1, 2, 3]))]);
        match build_request("one_sample_t_test", &p) {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "hypothesized_mean"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn polynomial_expansion_builds_power_columns() {
        let p = params(&[
            ("response", json!([1, 4, 9, 16, 25])),
            ("predictors", json!([1, 2, 3, 4, 5])),
            ("polynomial_degree", json!(2)),
        ]);
        let req = build_request("polynomial_regression", &p).unwrap();
        match req {
            CanonicalRequest::Regression { predictors, .. } => {
                assert_eq!(predictors.len(), 2);
                assert_eq!(predictors[1][2], Dec::from_int(9));
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn fisher_rejects_fractional_counts() {
        let p = params(&[("contingency_table", json!([[1.5, 2], [3, 4]]))]);
        assert!(matches!(
            build_request("fisher_exact", &p),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn power_requires_exactly_one_unknown() {
        let base = [("effect_size", json!(0.5))];
        assert!(build_request("power_analysis", &params(&base)).is_err());

        let mut both = params(&base);
        both.insert("sample_size".into(), json!(30));
        both.insert("power".into(), json!(0.8));
        assert!(build_request("power_analysis", &both).is_err());

        let mut solve_power = params(&base);
        solve_power.insert("sample_size".into(), json!(30));
        assert!(build_request("power_analysis", &solve_power).is_ok());
    }

    #[test]
    fn alias_tables_are_family_scoped() {
        // `observed` is a chi-square alias, not a t-test one.
        let p = params(&[("observed", json!([1, 2, 3])), ("hypothesized_mean", json!(0))]);
        assert!(build_request("one_sample_t_test", &p).is_err());
    }
}
