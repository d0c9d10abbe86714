//! Assumption guardian: pre-execution validation of test assumptions.
//!
//! Each check is a small state machine (`Pending → Running → verdict`)
//! producing an immutable [`AssumptionCheck`]. The policy is asymmetric on
//! purpose: `Warned` never blocks; only a `Failed` verdict on a check the
//! chosen test strictly requires turns into `GuardianBlocked`, carrying a
//! suggested alternative test where one exists.

use sg_common::{
    AssumptionCheck, Error, GuardianOutcome, GuardianReport, Recommendation, Result, Verdict,
};
use sg_math::dist::{chi_square_cdf, f_cdf};
use sg_math::{safe_div, sig_string, stats, Dec};

use crate::model::{
    CanonicalRequest, CategoricalKind, CorrelationMethod, Dataset, NonParametricKind, TTestKind,
};

/// Below this many observations a goodness-of-fit normality test has no
/// power worth reporting.
const NORMALITY_MIN_N: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CheckState {
    Pending,
    Running,
    Done,
}

/// One check run. Constructed `Pending`, driven to a verdict exactly once.
struct Check {
    name: &'static str,
    state: CheckState,
}

impl Check {
    fn new(name: &'static str) -> Self {
        Check {
            name,
            state: CheckState::Pending,
        }
    }

    fn run<F>(mut self, body: F) -> Result<AssumptionCheck>
    where
        F: FnOnce() -> Result<(Verdict, String, String)>,
    {
        debug_assert_eq!(self.state, CheckState::Pending);
        self.state = CheckState::Running;
        let (verdict, confidence, rationale) = body()?;
        self.state = CheckState::Done;
        tracing::debug!(check = self.name, verdict = %verdict, "assumption check complete");
        Ok(AssumptionCheck {
            name: self.name.into(),
            verdict,
            confidence,
            rationale,
        })
    }
}

/// A check plus its policy: whether a `Failed` verdict blocks, and the
/// alternative to suggest when it does.
struct GatedCheck {
    check: AssumptionCheck,
    mandatory: bool,
    alternative: Option<&'static str>,
}

/// Evaluate the guardian policy for one canonical request.
///
/// `Ok(outcome)` means the engine may proceed; a blocking report is
/// returned as `Err(GuardianBlocked)` so the statistic is never computed.
pub fn evaluate(request: &CanonicalRequest) -> Result<GuardianOutcome> {
    let gated = match request {
        CanonicalRequest::TTest { kind, .. } => match kind {
            TTestKind::OneSample { sample, .. } => one_group_parametric(&[sample], None)?,
            TTestKind::Paired { sample_a, sample_b } => {
                let diffs = paired_differences(sample_a, sample_b)?;
                one_group_parametric(&[&diffs], None)?
            }
            TTestKind::TwoSample {
                sample_a,
                sample_b,
                pooled,
            } => {
                let groups: Vec<&Dataset> = vec![sample_a, sample_b];
                let mut gated = vec![
                    gate(sample_size_check(&groups, 2)?, true, None),
                    gate(normality_check(&groups)?, false, None),
                    gate(outlier_check(&groups)?, false, None),
                ];
                if *pooled {
                    gated.insert(
                        1,
                        gate(
                            variance_homogeneity_check(&groups)?,
                            true,
                            Some("welch_t_test"),
                        ),
                    );
                }
                gated
            }
        },
        CanonicalRequest::Anova { groups, .. } => {
            let refs: Vec<&Dataset> = groups.iter().collect();
            vec![
                gate(sample_size_check(&refs, 2)?, true, None),
                gate(
                    variance_homogeneity_check(&refs)?,
                    true,
                    Some("kruskal_wallis"),
                ),
                gate(normality_check(&refs)?, false, None),
                gate(outlier_check(&refs)?, false, None),
            ]
        }
        CanonicalRequest::Regression {
            response,
            predictors,
            ..
        } => {
            let floor = predictors.len() + 2;
            vec![
                gate(sample_size_check(&[response], floor)?, true, None),
                gate(outlier_check(&[response])?, false, None),
            ]
        }
        CanonicalRequest::Correlation { method, x, y, .. } => {
            let groups: Vec<&Dataset> = vec![x, y];
            let mut gated = vec![gate(
                sample_size_check(&groups, 3)?,
                true,
                match method {
                    CorrelationMethod::Pearson => Some("spearman_correlation"),
                    CorrelationMethod::Spearman => None,
                },
            )];
            if *method == CorrelationMethod::Pearson {
                gated.push(gate(normality_check(&groups)?, false, None));
                gated.push(gate(outlier_check(&groups)?, false, None));
            }
            gated
        }
        CanonicalRequest::NonParametric { kind, .. } => match kind {
            NonParametricKind::MannWhitneyU { sample_a, sample_b }
            | NonParametricKind::WilcoxonSignedRank { sample_a, sample_b } => {
                vec![gate(sample_size_check(&[sample_a, sample_b], 2)?, true, None)]
            }
            NonParametricKind::KruskalWallis { groups } => {
                let refs: Vec<&Dataset> = groups.iter().collect();
                vec![gate(sample_size_check(&refs, 2)?, true, None)]
            }
            NonParametricKind::Friedman { blocks } => {
                let refs: Vec<&Dataset> = blocks.iter().collect();
                vec![gate(sample_size_check(&refs, 2)?, true, None)]
            }
        },
        CanonicalRequest::Categorical { kind, .. } => match kind {
            CategoricalKind::ChiSquareIndependence { table } => {
                vec![
                    gate(table_count_check(table)?, true, None),
                    gate(expected_count_check(table)?, false, Some("fisher_exact")),
                ]
            }
            CategoricalKind::ChiSquareGoodnessOfFit { observed, .. } => {
                vec![gate(observed_count_check(observed)?, true, None)]
            }
            CategoricalKind::FisherExact { table } => {
                let total: u64 = table.iter().flatten().sum();
                vec![gate(
                    count_total_check("contingency_table", total)?,
                    true,
                    None,
                )]
            }
            CategoricalKind::BinomialTest { trials, .. } => {
                vec![gate(count_total_check("trials", *trials)?, true, None)]
            }
        },
        // Power analysis consumes no dataset; there is nothing to validate.
        CanonicalRequest::PowerAnalysis { .. } => return Ok(GuardianOutcome::Skipped),
    };

    assemble(request.test_id(), gated)
}

fn gate(check: AssumptionCheck, mandatory: bool, alternative: Option<&'static str>) -> GatedCheck {
    GatedCheck {
        check,
        mandatory,
        alternative,
    }
}

/// Standard check set for a single-sample parametric test.
fn one_group_parametric(
    groups: &[&Dataset],
    alternative: Option<&'static str>,
) -> Result<Vec<GatedCheck>> {
    Ok(vec![
        gate(sample_size_check(groups, 2)?, true, alternative),
        gate(normality_check(groups)?, false, None),
        gate(outlier_check(groups)?, false, None),
    ])
}

fn assemble(test: &str, gated: Vec<GatedCheck>) -> Result<GuardianOutcome> {
    let mut blocking: Option<Option<&'static str>> = None;
    let mut cautioned = false;
    for g in &gated {
        match g.check.verdict {
            Verdict::Failed if g.mandatory => {
                if blocking.is_none() {
                    blocking = Some(g.alternative);
                }
            }
            Verdict::Failed | Verdict::Warned => cautioned = true,
            Verdict::Passed | Verdict::NotApplicable => {}
        }
    }

    let recommendation = match blocking {
        Some(alt) => Recommendation::UseAlternative(alt.map(String::from)),
        None if cautioned => Recommendation::ProceedWithCaution,
        None => Recommendation::Proceed,
    };
    let report = GuardianReport {
        test: test.to_string(),
        checks: gated.into_iter().map(|g| g.check).collect(),
        recommendation,
    };

    if report.is_blocking() {
        let suggested = match &report.recommendation {
            Recommendation::UseAlternative(alt) => alt.clone(),
            _ => None,
        };
        tracing::warn!(test, alternative = ?suggested, "guardian blocked test execution");
        return Err(Error::GuardianBlocked {
            report,
            suggested_alternative: suggested,
        });
    }
    Ok(GuardianOutcome::Report(report))
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

fn sample_size_check(groups: &[&Dataset], floor: usize) -> Result<AssumptionCheck> {
    Check::new("sample_size").run(|| {
        let smallest = groups.iter().map(|g| g.len()).min().unwrap_or(0);
        let verdict = if smallest >= floor {
            Verdict::Passed
        } else {
            Verdict::Failed
        };
        Ok((
            verdict,
            "1".to_string(),
            format!("smallest group has n = {smallest}; required floor is {floor}"),
        ))
    })
}

/// Jarque-Bera goodness of fit per group; the worst (smallest) p-value
/// across groups drives the verdict.
fn normality_check(groups: &[&Dataset]) -> Result<AssumptionCheck> {
    Check::new("normality").run(|| {
        let mut worst_p: Option<Dec> = None;
        let mut tested = 0usize;
        for group in groups {
            if group.len() < NORMALITY_MIN_N {
                continue;
            }
            let Some(p) = jarque_bera_p(group)? else {
                continue;
            };
            tested += 1;
            worst_p = Some(match worst_p {
                Some(current) if current <= p => current,
                _ => p,
            });
        }
        let Some(p) = worst_p else {
            let reason = if tested == 0 && groups.iter().all(|g| g.len() < NORMALITY_MIN_N) {
                format!("all groups below n = {NORMALITY_MIN_N}; goodness of fit not informative")
            } else {
                "no group had enough variability for a goodness-of-fit statistic".to_string()
            };
            return Ok((Verdict::NotApplicable, "0".to_string(), reason));
        };
        let verdict = verdict_from_p(&p);
        Ok((
            verdict,
            sig_string(&p),
            format!("smallest Jarque-Bera p-value across groups is {}", sig_string(&p)),
        ))
    })
}

/// Brown-Forsythe: one-way F on absolute deviations from group medians.
fn variance_homogeneity_check(groups: &[&Dataset]) -> Result<AssumptionCheck> {
    Check::new("variance_homogeneity").run(|| {
        if groups.iter().any(|g| g.len() < 2) {
            return Ok((
                Verdict::NotApplicable,
                "0".to_string(),
                "a group has fewer than 2 observations; spread cannot be compared".to_string(),
            ));
        }
        let mut deviations: Vec<Dataset> = Vec::with_capacity(groups.len());
        for group in groups {
            let med = stats::median(group)?;
            deviations.push(group.iter().map(|v| (v - &med).abs()).collect());
        }
        match one_way_f(&deviations)? {
            Some((_f, p)) => {
                let verdict = verdict_from_p(&p);
                Ok((
                    verdict,
                    sig_string(&p),
                    format!(
                        "Brown-Forsythe test of equal spread has p = {}",
                        sig_string(&p)
                    ),
                ))
            }
            None => Ok((
                Verdict::NotApplicable,
                "0".to_string(),
                "deviations from the group medians carry no variability".to_string(),
            )),
        }
    })
}

/// MAD-based robust z flagging. Warns, never fails: an outlier is a reason
/// for caution, not an invalid test.
fn outlier_check(groups: &[&Dataset]) -> Result<AssumptionCheck> {
    Check::new("outliers").run(|| {
        // Consistency constant for MAD as a normal-scale estimate.
        let mad_to_sigma = dec("1.4826");
        let threshold = dec("3.5");
        let mut flagged = 0usize;
        let mut total = 0usize;
        let mut scored = false;
        for group in groups {
            total += group.len();
            let med = stats::median(group)?;
            let mad = stats::mad(group)?;
            if mad.is_zero() {
                continue;
            }
            scored = true;
            let scale = &mad * &mad_to_sigma;
            for v in group.iter() {
                let z = safe_div(&(v - &med).abs(), &scale, "robust scale")?;
                if z > threshold {
                    flagged += 1;
                }
            }
        }
        if !scored {
            return Ok((
                Verdict::NotApplicable,
                "0".to_string(),
                "median absolute deviation is zero in every group".to_string(),
            ));
        }
        let clean = safe_div(
            &Dec::from_usize(total - flagged),
            &Dec::from_usize(total),
            "observation count",
        )?;
        if flagged == 0 {
            Ok((
                Verdict::Passed,
                sig_string(&clean),
                "no observation exceeds robust z = 3.5".to_string(),
            ))
        } else {
            Ok((
                Verdict::Warned,
                sig_string(&clean),
                format!("{flagged} of {total} observations exceed robust z = 3.5"),
            ))
        }
    })
}

/// Mandatory floor for count data: a table of all zeros has no information.
fn table_count_check(table: &[Vec<Dec>]) -> Result<AssumptionCheck> {
    Check::new("sample_size").run(|| {
        if table.iter().flatten().any(|c| c.is_negative()) {
            return Ok((
                Verdict::Failed,
                "1".to_string(),
                "contingency table contains negative counts".to_string(),
            ));
        }
        let total = table
            .iter()
            .flatten()
            .fold(Dec::zero(), |acc, v| &acc + v);
        if total.is_zero() {
            Ok((
                Verdict::Failed,
                "1".to_string(),
                "contingency table total is zero".to_string(),
            ))
        } else {
            Ok((
                Verdict::Passed,
                "1".to_string(),
                format!("table total is {}", sig_string(&total)),
            ))
        }
    })
}

/// Advisory chi-square applicability: all expected counts at least 5.
fn expected_count_check(table: &[Vec<Dec>]) -> Result<AssumptionCheck> {
    Check::new("expected_cell_counts").run(|| {
        let Some((expected, _total)) = expected_table(table)? else {
            return Ok((
                Verdict::NotApplicable,
                "0".to_string(),
                "expected counts are undefined for an empty margin".to_string(),
            ));
        };
        let five = Dec::from_int(5);
        let low = expected.iter().flatten().filter(|e| **e < five).count();
        let cells = expected.len() * expected.first().map(Vec::len).unwrap_or(0);
        let ok = safe_div(
            &Dec::from_usize(cells - low),
            &Dec::from_usize(cells),
            "cell count",
        )?;
        if low == 0 {
            Ok((
                Verdict::Passed,
                sig_string(&ok),
                "all expected cell counts are at least 5".to_string(),
            ))
        } else {
            Ok((
                Verdict::Warned,
                sig_string(&ok),
                format!(
                    "{low} of {cells} expected cell counts fall below 5; an exact test is more reliable"
                ),
            ))
        }
    })
}

fn observed_count_check(observed: &Dataset) -> Result<AssumptionCheck> {
    Check::new("sample_size").run(|| {
        if observed.iter().any(|c| c.is_negative()) {
            return Ok((
                Verdict::Failed,
                "1".to_string(),
                "observed counts contain a negative value".to_string(),
            ));
        }
        let total = observed.iter().fold(Dec::zero(), |acc, v| &acc + v);
        if total.is_zero() {
            Ok((
                Verdict::Failed,
                "1".to_string(),
                "observed counts sum to zero".to_string(),
            ))
        } else {
            Ok((
                Verdict::Passed,
                "1".to_string(),
                format!("observed total is {}", sig_string(&total)),
            ))
        }
    })
}

fn count_total_check(field: &'static str, total: u64) -> Result<AssumptionCheck> {
    Check::new("sample_size").run(|| {
        if total == 0 {
            Ok((
                Verdict::Failed,
                "1".to_string(),
                format!("{field} totals zero observations"),
            ))
        } else {
            Ok((
                Verdict::Passed,
                "1".to_string(),
                format!("{field} totals {total} observations"),
            ))
        }
    })
}

// ---------------------------------------------------------------------------
// Check internals
// ---------------------------------------------------------------------------

fn dec(s: &str) -> Dec {
    // Literals in this module are fixed and well formed.
    Dec::parse(s).unwrap_or_else(|_| Dec::zero())
}

/// p > 0.05 passes, 0.01 < p <= 0.05 warns, p <= 0.01 fails.
fn verdict_from_p(p: &Dec) -> Verdict {
    if *p > dec("0.05") {
        Verdict::Passed
    } else if *p > dec("0.01") {
        Verdict::Warned
    } else {
        Verdict::Failed
    }
}

/// Jarque-Bera p-value, `None` when the sample has no variability.
fn jarque_bera_p(sample: &Dataset) -> Result<Option<Dec>> {
    let n = sample.len();
    let n_dec = Dec::from_usize(n);
    let mean = stats::mean(sample)?;
    let mut m2 = Dec::zero();
    let mut m3 = Dec::zero();
    let mut m4 = Dec::zero();
    for v in sample {
        let d = v - &mean;
        let d2 = &d * &d;
        m2 = &m2 + &d2;
        m3 = &m3 + &(&d2 * &d);
        m4 = &m4 + &(&d2 * &d2);
    }
    if m2.is_zero() {
        return Ok(None);
    }
    m2 = safe_div(&m2, &n_dec, "n")?;
    m3 = safe_div(&m3, &n_dec, "n")?;
    m4 = safe_div(&m4, &n_dec, "n")?;

    // S^2 = m3^2 / m2^3, K = m4 / m2^2 - 3.
    let m2_cubed = &(&m2 * &m2) * &m2;
    let skew_sq = safe_div(&(&m3 * &m3), &m2_cubed, "m2^3")?;
    let kurt = &safe_div(&m4, &(&m2 * &m2), "m2^2")? - &Dec::from_int(3);
    let kurt_sq = &kurt * &kurt;
    let quarter_kurt = kurt_sq.halve().halve();
    let jb = &safe_div(&n_dec, &Dec::from_int(6), "6")? * &(&skew_sq + &quarter_kurt);

    let p = &Dec::one() - &chi_square_cdf(&jb, &Dec::from_int(2))?;
    Ok(Some(p))
}

/// One-way F statistic and upper-tail p over the supplied groups.
/// `None` when the within-group sum of squares vanishes.
fn one_way_f(groups: &[Dataset]) -> Result<Option<(Dec, Dec)>> {
    let k = groups.len();
    let total_n: usize = groups.iter().map(Vec::len).sum();
    if k < 2 || total_n <= k {
        return Ok(None);
    }
    let grand_sum = groups.iter().map(|g| stats::sum(g)).fold(Dec::zero(), |a, b| &a + &b);
    let grand_mean = safe_div(&grand_sum, &Dec::from_usize(total_n), "total n")?;

    let mut ss_between = Dec::zero();
    let mut ss_within = Dec::zero();
    for group in groups {
        let m = stats::mean(group)?;
        let dm = &m - &grand_mean;
        ss_between = &ss_between + &(&Dec::from_usize(group.len()) * &(&dm * &dm));
        for v in group {
            let d = v - &m;
            ss_within = &ss_within + &(&d * &d);
        }
    }
    if ss_within.is_zero() {
        return Ok(None);
    }
    let df_between = Dec::from_usize(k - 1);
    let df_within = Dec::from_usize(total_n - k);
    let ms_between = safe_div(&ss_between, &df_between, "between df")?;
    let ms_within = safe_div(&ss_within, &df_within, "within df")?;
    let f = safe_div(&ms_between, &ms_within, "within mean square")?;
    let p = &Dec::one() - &f_cdf(&f, &df_between, &df_within)?;
    Ok(Some((f, p)))
}

/// Row/column margin expected counts; `None` when a margin is zero.
pub(crate) fn expected_table(table: &[Vec<Dec>]) -> Result<Option<(Vec<Vec<Dec>>, Dec)>> {
    let rows = table.len();
    let cols = table.first().map(Vec::len).unwrap_or(0);
    let mut row_sums = vec![Dec::zero(); rows];
    let mut col_sums = vec![Dec::zero(); cols];
    let mut total = Dec::zero();
    for (i, row) in table.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            row_sums[i] = &row_sums[i] + cell;
            col_sums[j] = &col_sums[j] + cell;
            total = &total + cell;
        }
    }
    if total.is_zero() || row_sums.iter().any(Dec::is_zero) || col_sums.iter().any(Dec::is_zero) {
        return Ok(None);
    }
    let mut expected = vec![vec![Dec::zero(); cols]; rows];
    for i in 0..rows {
        for j in 0..cols {
            expected[i][j] = safe_div(&(&row_sums[i] * &col_sums[j]), &total, "table total")?;
        }
    }
    Ok(Some((expected, total)))
}

/// Element-wise differences for paired designs; lengths must match.
pub(crate) fn paired_differences(a: &Dataset, b: &Dataset) -> Result<Dataset> {
    if a.len() != b.len() {
        return Err(Error::Validation {
            field: "sample_b".into(),
            reason: format!(
                "paired samples must have equal length ({} vs {})",
                a.len(),
                b.len()
            ),
        });
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x - y).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Alternative;

    fn data(vals: &[&str]) -> Dataset {
        vals.iter().map(|s| Dec::parse(s).unwrap()).collect()
    }

    fn two_sample(a: &[&str], b: &[&str], pooled: bool) -> CanonicalRequest {
        CanonicalRequest::TTest {
            kind: TTestKind::TwoSample {
                sample_a: data(a),
                sample_b: data(b),
                pooled,
            },
            alpha: Dec::parse("0.05").unwrap(),
            alternative: Alternative::TwoSided,
        }
    }

    #[test]
    fn blocks_two_groups_of_size_one() {
        let req = two_sample(&["1"], &["2"], false);
        match evaluate(&req) {
            Err(Error::GuardianBlocked { report, .. }) => {
                let check = report.check("sample_size").unwrap();
                assert_eq!(check.verdict, Verdict::Failed);
            }
            other => panic!("expected guardian block, got {other:?}"),
        }
    }

    #[test]
    fn healthy_groups_proceed() {
        let req = two_sample(
            &["120", "125", "130", "128", "132"],
            &["140", "138", "142", "145", "139"],
            false,
        );
        match evaluate(&req).unwrap() {
            GuardianOutcome::Report(report) => {
                assert_eq!(
                    report.check("sample_size").unwrap().verdict,
                    Verdict::Passed
                );
                assert!(!report.is_blocking());
            }
            GuardianOutcome::Skipped => panic!("guardian should run for a t-test"),
        }
    }

    #[test]
    fn pooled_block_suggests_welch() {
        // One group much more spread than the other, large n so the
        // Brown-Forsythe test has power.
        let tight: &[&str] = &[
            "10.0", "10.1", "9.9", "10.05", "9.95", "10.02", "9.98", "10.01", "9.99", "10.03",
            "9.97", "10.04", "9.96", "10.06", "9.94", "10.07",
        ];
        let wide: &[&str] = &[
            "10", "30", "-10", "25", "-5", "40", "-20", "35", "-15", "50", "-30", "45", "-25",
            "60", "-40", "55",
        ];
        let req = two_sample(&tight, &wide, true);
        match evaluate(&req) {
            Err(Error::GuardianBlocked {
                suggested_alternative,
                report,
            }) => {
                assert_eq!(suggested_alternative.as_deref(), Some("welch_t_test"));
                assert_eq!(
                    report.check("variance_homogeneity").unwrap().verdict,
                    Verdict::Failed
                );
            }
            other => panic!("expected pooled block, got {other:?}"),
        }
    }

    #[test]
    fn welch_ignores_unequal_variances() {
        let tight: &[&str] = &[
            "10.0", "10.1", "9.9", "10.05", "9.95", "10.02", "9.98", "10.01", "9.99", "10.03",
            "9.97", "10.04", "9.96", "10.06", "9.94", "10.07",
        ];
        let wide: &[&str] = &[
            "10", "30", "-10", "25", "-5", "40", "-20", "35", "-15", "50", "-30", "45", "-25",
            "60", "-40", "55",
        ];
        let req = two_sample(&tight, &wide, false);
        assert!(evaluate(&req).is_ok());
    }

    #[test]
    fn normality_not_applicable_below_floor() {
        let req = two_sample(&["1", "2", "3"], &["4", "5", "6"], false);
        match evaluate(&req).unwrap() {
            GuardianOutcome::Report(report) => {
                assert_eq!(
                    report.check("normality").unwrap().verdict,
                    Verdict::NotApplicable
                );
            }
            GuardianOutcome::Skipped => panic!("guardian should run"),
        }
    }

    #[test]
    fn outliers_warn_but_never_block() {
        let with_outlier: &[&str] = &["10", "11", "9", "10", "11", "9", "10", "500"];
        let req = CanonicalRequest::TTest {
            kind: TTestKind::OneSample {
                sample: data(with_outlier),
                hypothesized_mean: Dec::from_int(10),
            },
            alpha: Dec::parse("0.05").unwrap(),
            alternative: Alternative::TwoSided,
        };
        match evaluate(&req).unwrap() {
            GuardianOutcome::Report(report) => {
                assert_eq!(report.check("outliers").unwrap().verdict, Verdict::Warned);
                assert_eq!(report.recommendation, Recommendation::ProceedWithCaution);
            }
            GuardianOutcome::Skipped => panic!("guardian should run"),
        }
    }

    #[test]
    fn power_analysis_is_skipped() {
        let req = CanonicalRequest::PowerAnalysis {
            query: crate::model::PowerQuery {
                design: crate::model::PowerDesign::TwoSample,
                effect_size: Dec::parse("0.5").unwrap(),
                sample_size: Some(30),
                power: None,
            },
            alpha: Dec::parse("0.05").unwrap(),
            alternative: Alternative::TwoSided,
        };
        assert_eq!(evaluate(&req).unwrap(), GuardianOutcome::Skipped);
    }

    #[test]
    fn low_expected_counts_warn_toward_exact_test() {
        let table = vec![data(&["1", "9"]), data(&["8", "2"])];
        let req = CanonicalRequest::Categorical {
            kind: CategoricalKind::ChiSquareIndependence { table },
            alternative: Alternative::TwoSided,
        };
        match evaluate(&req).unwrap() {
            GuardianOutcome::Report(report) => {
                let check = report.check("expected_cell_counts").unwrap();
                assert_eq!(check.verdict, Verdict::Warned);
                assert!(check.rationale.contains("exact test"));
            }
            GuardianOutcome::Skipped => panic!("guardian should run"),
        }
    }
}
