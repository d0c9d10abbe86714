//! Pearson and Spearman correlation.

use sg_common::{CanonicalResult, Error, GuardianOutcome, Result};
use sg_math::dist::student_t_cdf;
use sg_math::{linalg, safe_div, sig_string, stats, Dec};

use super::{p_from_cdf, put};
use crate::model::{Alternative, CorrelationMethod, Dataset};

pub(super) fn run(
    method: CorrelationMethod,
    x: &Dataset,
    y: &Dataset,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    if x.len() != y.len() {
        return Err(Error::Validation {
            field: "y".into(),
            reason: format!("x has {} observations, y has {}", x.len(), y.len()),
        });
    }
    let (test, label, x, y) = match method {
        CorrelationMethod::Pearson => ("pearson_correlation", "r", x.clone(), y.clone()),
        CorrelationMethod::Spearman => {
            let (rx, _) = linalg::ranks(x);
            let (ry, _) = linalg::ranks(y);
            ("spearman_correlation", "rho", rx, ry)
        }
    };

    let mx = stats::mean(&x)?;
    let my = stats::mean(&y)?;
    let mut sxy = Dec::zero();
    let mut sxx = Dec::zero();
    let mut syy = Dec::zero();
    for (a, b) in x.iter().zip(y.iter()) {
        let dx = a - &mx;
        let dy = b - &my;
        sxy = &sxy + &(&dx * &dy);
        sxx = &sxx + &(&dx * &dx);
        syy = &syy + &(&dy * &dy);
    }
    if sxx.is_zero() || syy.is_zero() {
        return Err(Error::DegenerateInput {
            quantity: "sample variance".into(),
            detail: "one of the variables is constant".into(),
        });
    }
    let r = safe_div(&sxy, &(&sxx * &syy).sqrt()?, "sqrt(Sxx Syy)")?;

    let one_minus_r2 = &Dec::one() - &(&r * &r);
    if one_minus_r2.is_zero() || one_minus_r2.is_negative() {
        return Err(Error::DegenerateInput {
            quantity: "1 - r^2".into(),
            detail: "correlation is exactly +/-1; the t statistic is undefined".into(),
        });
    }
    let n = x.len();
    let df = Dec::from_usize(n - 2);
    let scale = safe_div(&df, &one_minus_r2, "1 - r^2")?.sqrt()?;
    let t = &r * &scale;
    let p = p_from_cdf(&student_t_cdf(&t, &df)?, alternative);

    let mut result = CanonicalResult::new(test, outcome);
    put(&mut result.statistics, label, &r);
    put(&mut result.statistics, "t", &t);
    put(&mut result.statistics, "df", &df);
    result.p_value = sig_string(&p);
    put(&mut result.effect_sizes, "r_squared", &(&r * &r));
    Ok(result)
}
