//! Categorical tests: chi-square (independence and goodness of fit) and the
//! exact tests (Fisher 2x2, exact binomial).
//!
//! The exact tests accumulate their tail probabilities as exact rationals
//! and convert to decimal once at the end, so summed tails lose nothing.

use num_rational::BigRational;
use num_traits::Zero;
use sg_common::{CanonicalResult, Error, GuardianOutcome, Result};
use sg_math::combinatorics::{binomial_pmf, hypergeometric_pmf, rational_to_dec};
use sg_math::dist::chi_square_cdf;
use sg_math::{safe_div, sig_string, Dec};

use super::{put, upper_tail};
use crate::guardian::expected_table;
use crate::model::{Alternative, CategoricalKind, Dataset};

pub(super) fn run(
    kind: &CategoricalKind,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    match kind {
        CategoricalKind::ChiSquareIndependence { table } => independence(table, outcome),
        CategoricalKind::ChiSquareGoodnessOfFit { observed, expected } => {
            goodness_of_fit(observed, expected.as_deref(), outcome)
        }
        CategoricalKind::FisherExact { table } => fisher_exact(table, alternative, outcome),
        CategoricalKind::BinomialTest {
            successes,
            trials,
            probability,
        } => binomial_test(*successes, *trials, probability, alternative, outcome),
    }
}

fn independence(table: &[Vec<Dec>], outcome: GuardianOutcome) -> Result<CanonicalResult> {
    let Some((expected, total)) = expected_table(table)? else {
        return Err(Error::DegenerateInput {
            quantity: "margin total".into(),
            detail: "a row or column of the contingency table is zero".into(),
        });
    };
    let rows = table.len();
    let cols = table[0].len();

    let mut stat = Dec::zero();
    for i in 0..rows {
        for j in 0..cols {
            let d = &table[i][j] - &expected[i][j];
            stat = &stat + &safe_div(&(&d * &d), &expected[i][j], "expected count")?;
        }
    }
    let df = Dec::from_usize((rows - 1) * (cols - 1));
    let p = upper_tail(&chi_square_cdf(&stat, &df)?);

    // Cramer's V.
    let min_dim = Dec::from_usize(rows.min(cols) - 1);
    let v = safe_div(&stat, &(&total * &min_dim), "n (min dim - 1)")?.sqrt()?;

    let mut result = CanonicalResult::new("chi_square_independence", outcome);
    put(&mut result.statistics, "chi_square", &stat);
    put(&mut result.statistics, "df", &df);
    result.p_value = sig_string(&p);
    put(&mut result.effect_sizes, "cramers_v", &v);
    put(&mut result.diagnostics, "total", &total);
    Ok(result)
}

fn goodness_of_fit(
    observed: &Dataset,
    expected: Option<&[Dec]>,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let k = observed.len();
    if k < 2 {
        return Err(Error::Validation {
            field: "observed".into(),
            reason: format!("need at least 2 categories, got {k}"),
        });
    }
    let total = observed.iter().fold(Dec::zero(), |acc, v| &acc + v);

    // Expected counts: scale supplied counts/probabilities to the observed
    // total, or distribute uniformly.
    let expected: Vec<Dec> = match expected {
        Some(given) => {
            if given.len() != k {
                return Err(Error::Validation {
                    field: "expected".into(),
                    reason: format!("{} expected values for {k} observed categories", given.len()),
                });
            }
            if given.iter().any(|e| e.is_negative() || e.is_zero()) {
                return Err(Error::Validation {
                    field: "expected".into(),
                    reason: "expected values must be positive".into(),
                });
            }
            let given_total = given.iter().fold(Dec::zero(), |acc, v| &acc + v);
            let factor = safe_div(&total, &given_total, "expected total")?;
            given.iter().map(|e| e * &factor).collect()
        }
        None => {
            let uniform = safe_div(&total, &Dec::from_usize(k), "category count")?;
            vec![uniform; k]
        }
    };
    if expected.iter().any(Dec::is_zero) {
        return Err(Error::DegenerateInput {
            quantity: "expected count".into(),
            detail: "observed total is zero".into(),
        });
    }

    let mut stat = Dec::zero();
    for (o, e) in observed.iter().zip(expected.iter()) {
        let d = o - e;
        stat = &stat + &safe_div(&(&d * &d), e, "expected count")?;
    }
    let df = Dec::from_usize(k - 1);
    let p = upper_tail(&chi_square_cdf(&stat, &df)?);

    let mut result = CanonicalResult::new("chi_square_goodness_of_fit", outcome);
    put(&mut result.statistics, "chi_square", &stat);
    put(&mut result.statistics, "df", &df);
    result.p_value = sig_string(&p);
    put(&mut result.diagnostics, "total", &total);
    Ok(result)
}

/// Fisher's exact test on a 2x2 table. Conditional on the margins, the
/// first cell follows a hypergeometric distribution; the two-sided p-value
/// sums every table whose probability does not exceed the observed one.
fn fisher_exact(
    table: &[[u64; 2]; 2],
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let [[a, b], [c, d]] = *table;
    let row1 = a + b;
    let col1 = a + c;
    let total = a + b + c + d;

    let p_obs = hypergeometric_pmf(a, col1, total, row1)?;
    let lo = col1.saturating_sub(total - row1);
    let hi = row1.min(col1);

    let mut p_rational = BigRational::zero();
    for k in lo..=hi {
        let pk = hypergeometric_pmf(k, col1, total, row1)?;
        let include = match alternative {
            Alternative::Less => k <= a,
            Alternative::Greater => k >= a,
            Alternative::TwoSided => pk <= p_obs,
        };
        if include {
            p_rational += pk;
        }
    }
    let p = rational_to_dec(&p_rational)?;

    let mut result = CanonicalResult::new("fisher_exact", outcome);
    result.p_value = sig_string(&p);
    // Sample odds ratio, when finite.
    if b > 0 && c > 0 {
        let or = safe_div(
            &Dec::from_usize((a * d) as usize),
            &Dec::from_usize((b * c) as usize),
            "b c",
        )?;
        put(&mut result.effect_sizes, "odds_ratio", &or);
    }
    put(&mut result.diagnostics, "observed_a", &Dec::from_usize(a as usize));
    Ok(result)
}

/// Exact binomial test. Directional tails are exact cumulative sums; the
/// two-sided p-value follows the small-p-values rule.
fn binomial_test(
    successes: u64,
    trials: u64,
    probability: &Dec,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    if successes > trials {
        return Err(Error::Validation {
            field: "successes".into(),
            reason: format!("{successes} successes exceed {trials} trials"),
        });
    }
    if probability.is_negative() || *probability > Dec::one() {
        return Err(Error::Validation {
            field: "probability".into(),
            reason: format!("probability must lie in [0, 1], got {probability}"),
        });
    }
    let p0 = probability.to_rational();
    let p_obs = binomial_pmf(successes, trials, &p0)?;

    let mut p_rational = BigRational::zero();
    for k in 0..=trials {
        let pk = binomial_pmf(k, trials, &p0)?;
        let include = match alternative {
            Alternative::Less => k <= successes,
            Alternative::Greater => k >= successes,
            Alternative::TwoSided => pk <= p_obs,
        };
        if include {
            p_rational += pk;
        }
    }
    let p = rational_to_dec(&p_rational)?;

    let expected = &Dec::from_usize(trials as usize) * probability;
    let mut result = CanonicalResult::new("binomial_test", outcome);
    put(
        &mut result.statistics,
        "successes",
        &Dec::from_usize(successes as usize),
    );
    put(
        &mut result.statistics,
        "trials",
        &Dec::from_usize(trials as usize),
    );
    result.p_value = sig_string(&p);
    put(&mut result.diagnostics, "expected_successes", &expected);
    Ok(result)
}
