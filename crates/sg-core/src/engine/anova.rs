//! One-way analysis of variance.

use sg_common::{CanonicalResult, Error, GuardianOutcome, Result};
use sg_math::dist::f_cdf;
use sg_math::{safe_div, sig_string, stats, Dec};

use super::{put, upper_tail};
use crate::model::Dataset;

pub(super) fn run(
    groups: &[Dataset],
    _alpha: &Dec,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let k = groups.len();
    let total_n: usize = groups.iter().map(Vec::len).sum();
    if total_n <= k {
        return Err(Error::DegenerateInput {
            quantity: "within-group degrees of freedom".into(),
            detail: format!("{total_n} observations across {k} groups leave no residual df"),
        });
    }

    let grand_sum = groups
        .iter()
        .map(|g| stats::sum(g))
        .fold(Dec::zero(), |acc, s| &acc + &s);
    let grand_mean = safe_div(&grand_sum, &Dec::from_usize(total_n), "total n")?;

    let mut ss_between = Dec::zero();
    let mut ss_within = Dec::zero();
    let mut group_means = Vec::with_capacity(k);
    for group in groups {
        let m = stats::mean(group)?;
        let dm = &m - &grand_mean;
        ss_between = &ss_between + &(&Dec::from_usize(group.len()) * &(&dm * &dm));
        for v in group {
            let d = v - &m;
            ss_within = &ss_within + &(&d * &d);
        }
        group_means.push(m);
    }
    if ss_within.is_zero() {
        return Err(Error::DegenerateInput {
            quantity: "within-group sum of squares".into(),
            detail: "every group is constant; the F ratio is undefined".into(),
        });
    }

    let df_between = Dec::from_usize(k - 1);
    let df_within = Dec::from_usize(total_n - k);
    let ms_between = safe_div(&ss_between, &df_between, "between df")?;
    let ms_within = safe_div(&ss_within, &df_within, "within df")?;
    let f = safe_div(&ms_between, &ms_within, "within mean square")?;
    let p = upper_tail(&f_cdf(&f, &df_between, &df_within)?);

    let ss_total = &ss_between + &ss_within;
    let eta_squared = safe_div(&ss_between, &ss_total, "total sum of squares")?;

    let mut result = CanonicalResult::new("one_way_anova", outcome);
    put(&mut result.statistics, "f", &f);
    put(&mut result.statistics, "df_between", &df_between);
    put(&mut result.statistics, "df_within", &df_within);
    put(&mut result.statistics, "ss_between", &ss_between);
    put(&mut result.statistics, "ss_within", &ss_within);
    result.p_value = sig_string(&p);
    put(&mut result.effect_sizes, "eta_squared", &eta_squared);
    put(&mut result.diagnostics, "grand_mean", &grand_mean);
    for (i, m) in group_means.iter().enumerate() {
        put(&mut result.diagnostics, &format!("group_{}_mean", i + 1), m);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(vals: &[i64]) -> Dataset {
        vals.iter().map(|&v| Dec::from_int(v)).collect()
    }

    #[test]
    fn textbook_three_group_anova() {
        // Groups with clearly separated means.
        let groups = vec![data(&[1, 2, 3]), data(&[4, 5, 6]), data(&[7, 8, 9])];
        let result = run(
            &groups,
            &Dec::parse("0.05").unwrap(),
            GuardianOutcome::Skipped,
        )
        .unwrap();
        // SSB = 54, SSW = 6, F = (54/2)/(6/6) = 27.
        assert_eq!(result.statistics["f"], "27");
        assert_eq!(result.statistics["df_between"], "2");
        assert_eq!(result.statistics["df_within"], "6");
        let eta = Dec::parse(&result.effect_sizes["eta_squared"]).unwrap();
        assert_eq!(eta, Dec::parse("0.9").unwrap());
        let p = Dec::parse(&result.p_value).unwrap();
        assert!(p < Dec::parse("0.01").unwrap());
    }

    #[test]
    fn constant_groups_are_degenerate() {
        let groups = vec![data(&[5, 5, 5]), data(&[9, 9, 9])];
        let err = run(
            &groups,
            &Dec::parse("0.05").unwrap(),
            GuardianOutcome::Skipped,
        )
        .unwrap_err();
        assert!(matches!(err, Error::DegenerateInput { .. }));
    }

    #[test]
    fn identical_group_means_give_zero_f() {
        let groups = vec![data(&[1, 2, 3]), data(&[2, 1, 3])];
        let result = run(
            &groups,
            &Dec::parse("0.05").unwrap(),
            GuardianOutcome::Skipped,
        )
        .unwrap();
        assert_eq!(result.statistics["f"], "0");
        assert_eq!(result.p_value, "1");
    }
}
