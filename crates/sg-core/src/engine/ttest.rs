//! T-test family: one-sample, paired, pooled and Welch two-sample.

use sg_common::{CanonicalResult, Error, GuardianOutcome, Result};
use sg_math::dist::{student_t_cdf, student_t_quantile};
use sg_math::{safe_div, stats, Dec};

use super::{p_from_cdf, put};
use crate::guardian::paired_differences;
use crate::model::{Alternative, Dataset, TTestKind};

pub(super) fn run(
    kind: &TTestKind,
    alpha: &Dec,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    match kind {
        TTestKind::OneSample {
            sample,
            hypothesized_mean,
        } => location_test(
            "one_sample_t_test",
            sample,
            hypothesized_mean,
            alpha,
            alternative,
            outcome,
        ),
        TTestKind::Paired { sample_a, sample_b } => {
            let diffs = paired_differences(sample_a, sample_b)?;
            location_test(
                "paired_t_test",
                &diffs,
                &Dec::zero(),
                alpha,
                alternative,
                outcome,
            )
        }
        TTestKind::TwoSample {
            sample_a,
            sample_b,
            pooled,
        } => two_sample(sample_a, sample_b, *pooled, alpha, alternative, outcome),
    }
}

/// One-sample t-test of a mean against a hypothesized value; also carries
/// the paired test, which is the same test on element-wise differences.
fn location_test(
    test: &'static str,
    sample: &Dataset,
    null_mean: &Dec,
    alpha: &Dec,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let n = sample.len();
    let mean = stats::mean(sample)?;
    let sd = stats::std_dev(sample)?;
    if sd.is_zero() {
        return Err(Error::DegenerateInput {
            quantity: "sample standard deviation".into(),
            detail: "all observations are identical".into(),
        });
    }
    let sqrt_n = Dec::from_usize(n).sqrt()?;
    let se = safe_div(&sd, &sqrt_n, "sqrt(n)")?;
    let diff = &mean - null_mean;
    let t = safe_div(&diff, &se, "standard error")?;
    let df = Dec::from_usize(n - 1);

    let cdf = student_t_cdf(&t, &df)?;
    let p = p_from_cdf(&cdf, alternative);
    let ci = symmetric_interval(&mean, &se, alpha, &df)?;
    let cohen_d = safe_div(&diff, &sd, "standard deviation")?;

    let mut result = CanonicalResult::new(test, outcome);
    put(&mut result.statistics, "t", &t);
    put(&mut result.statistics, "df", &df);
    result.p_value = p_to_string(&p);
    result.confidence_interval = Some(ci);
    put(&mut result.effect_sizes, "cohen_d", &cohen_d);
    put(&mut result.diagnostics, "mean", &mean);
    put(&mut result.diagnostics, "standard_error", &se);
    Ok(result)
}

fn two_sample(
    sample_a: &Dataset,
    sample_b: &Dataset,
    pooled: bool,
    alpha: &Dec,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let n1 = Dec::from_usize(sample_a.len());
    let n2 = Dec::from_usize(sample_b.len());
    let m1 = stats::mean(sample_a)?;
    let m2 = stats::mean(sample_b)?;
    let v1 = stats::variance(sample_a)?;
    let v2 = stats::variance(sample_b)?;
    if v1.is_zero() && v2.is_zero() {
        return Err(Error::DegenerateInput {
            quantity: "sample variance".into(),
            detail: "both groups are constant".into(),
        });
    }
    let diff = &m1 - &m2;
    let one = Dec::one();

    // Pooled variance is also the Cohen's d denominator for both flavors.
    let df_pool = &(&n1 + &n2) - &Dec::from_int(2);
    let pooled_num = &(&(&n1 - &one) * &v1) + &(&(&n2 - &one) * &v2);
    let sp2 = safe_div(&pooled_num, &df_pool, "pooled df")?;

    let (t, df, se) = if pooled {
        let inv = &safe_div(&one, &n1, "n1")? + &safe_div(&one, &n2, "n2")?;
        let se = (&sp2 * &inv).sqrt()?;
        let t = safe_div(&diff, &se, "pooled standard error")?;
        (t, df_pool.clone(), se)
    } else {
        let a1 = safe_div(&v1, &n1, "n1")?;
        let a2 = safe_div(&v2, &n2, "n2")?;
        let se2 = &a1 + &a2;
        let se = se2.sqrt()?;
        let t = safe_div(&diff, &se, "standard error")?;
        // Welch-Satterthwaite degrees of freedom.
        let num = &se2 * &se2;
        let den = &safe_div(&(&a1 * &a1), &(&n1 - &one), "n1 - 1")?
            + &safe_div(&(&a2 * &a2), &(&n2 - &one), "n2 - 1")?;
        let df = safe_div(&num, &den, "Welch denominator")?;
        (t, df, se)
    };

    let cdf = student_t_cdf(&t, &df)?;
    let p = p_from_cdf(&cdf, alternative);
    let ci = symmetric_interval(&diff, &se, alpha, &df)?;
    let pooled_sd = sp2.sqrt()?;
    let cohen_d = safe_div(&diff, &pooled_sd, "pooled standard deviation")?;

    let test = if pooled { "pooled_t_test" } else { "welch_t_test" };
    let mut result = CanonicalResult::new(test, outcome);
    put(&mut result.statistics, "t", &t);
    put(&mut result.statistics, "df", &df);
    result.p_value = p_to_string(&p);
    result.confidence_interval = Some(ci);
    put(&mut result.effect_sizes, "cohen_d", &cohen_d);
    put(&mut result.diagnostics, "mean_a", &m1);
    put(&mut result.diagnostics, "mean_b", &m2);
    put(&mut result.diagnostics, "mean_difference", &diff);
    put(&mut result.diagnostics, "standard_error", &se);
    Ok(result)
}

/// Two-sided `1 - alpha` interval: center ± t_{1-alpha/2, df} · se.
fn symmetric_interval(
    center: &Dec,
    se: &Dec,
    alpha: &Dec,
    df: &Dec,
) -> Result<(String, String)> {
    let quantile_p = &Dec::one() - &alpha.halve();
    let tq = student_t_quantile(&quantile_p, df)?;
    let half_width = &tq * se;
    let lower = center - &half_width;
    let upper = center + &half_width;
    Ok((sg_math::sig_string(&lower), sg_math::sig_string(&upper)))
}

fn p_to_string(p: &Dec) -> String {
    sg_math::sig_string(p)
}
