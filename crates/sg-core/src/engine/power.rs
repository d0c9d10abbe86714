//! Power analysis for one- and two-sample t designs, normal approximation.
//!
//! power = Phi(|d| sqrt(n / k) - z_crit), with k = 1 for one-sample and 2
//! for two-sample designs (n per group). Solving for n inverts the formula
//! and then walks forward until the target is actually met.

use num_traits::ToPrimitive;
use sg_common::{CanonicalResult, Error, GuardianOutcome, Result};
use sg_math::dist::{normal_cdf, normal_quantile};
use sg_math::{safe_div, sig_string, Dec};

use super::put;
use crate::model::{Alternative, PowerDesign, PowerQuery};

const SOLVE_N_MAX_STEPS: usize = 10_000;

pub(super) fn run(
    query: &PowerQuery,
    alpha: &Dec,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    if query.effect_size.is_zero() {
        return Err(Error::DegenerateInput {
            quantity: "effect size".into(),
            detail: "power is undefined at zero effect".into(),
        });
    }
    let d = query.effect_size.abs();
    let groups = match query.design {
        PowerDesign::OneSample => Dec::one(),
        PowerDesign::TwoSample => Dec::from_int(2),
    };
    // Two-sided designs split alpha across both tails.
    let tail_alpha = match alternative {
        Alternative::TwoSided => alpha.halve(),
        Alternative::Less | Alternative::Greater => alpha.clone(),
    };
    let z_crit = normal_quantile(&(&Dec::one() - &tail_alpha))?;

    let mut result = CanonicalResult::new("power_analysis", outcome);
    put(&mut result.diagnostics, "effect_size", &d);
    put(&mut result.diagnostics, "alpha", alpha);
    put(&mut result.diagnostics, "z_critical", &z_crit);

    match (query.sample_size, &query.power) {
        (Some(n), None) => {
            if n < 2 {
                return Err(Error::Validation {
                    field: "sample_size".into(),
                    reason: format!("need at least 2 observations per group, got {n}"),
                });
            }
            let power = achieved_power(&d, n, &groups, &z_crit)?;
            put(&mut result.statistics, "power", &power);
            put(&mut result.statistics, "sample_size", &Dec::from_usize(n as usize));
        }
        (None, Some(target)) => {
            if target.is_zero() || target.is_negative() || *target >= Dec::one() {
                return Err(Error::Validation {
                    field: "power".into(),
                    reason: format!("target power must lie in (0, 1), got {target}"),
                });
            }
            let n = solve_sample_size(&d, target, &groups, &z_crit)?;
            let power = achieved_power(&d, n, &groups, &z_crit)?;
            put(&mut result.statistics, "sample_size", &Dec::from_usize(n as usize));
            put(&mut result.statistics, "achieved_power", &power);
        }
        // The adapter guarantees exactly one unknown.
        _ => {
            return Err(Error::Validation {
                field: "power".into(),
                reason: "exactly one of sample_size and power must be supplied".into(),
            })
        }
    }
    Ok(result)
}

fn achieved_power(d: &Dec, n: u64, groups: &Dec, z_crit: &Dec) -> Result<Dec> {
    let n_dec = Dec::from_usize(n as usize);
    let lambda = &(d * &safe_div(&n_dec, groups, "group count")?.sqrt()?) - z_crit;
    normal_cdf(&lambda)
}

/// Smallest per-group n reaching the target power. The closed-form estimate
/// n = k ((z_alpha + z_power) / d)^2 seeds a bounded forward search.
fn solve_sample_size(d: &Dec, target: &Dec, groups: &Dec, z_crit: &Dec) -> Result<u64> {
    let z_power = normal_quantile(target)?;
    let ratio = safe_div(&(z_crit + &z_power), d, "effect size")?;
    let estimate = &(&ratio * &ratio) * groups;

    let mut n = estimate
        .to_rational()
        .ceil()
        .to_integer()
        .to_u64()
        .unwrap_or(2)
        .max(2);
    for _ in 0..SOLVE_N_MAX_STEPS {
        if achieved_power(d, n, groups, z_crit)? >= *target {
            // Also shrink back in case the estimate overshot.
            while n > 2 && achieved_power(d, n - 1, groups, z_crit)? >= *target {
                n -= 1;
            }
            return Ok(n);
        }
        n += 1;
    }
    Err(Error::Convergence {
        routine: "solve_sample_size".into(),
        max_iterations: SOLVE_N_MAX_STEPS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(design: PowerDesign, d: &str, n: Option<u64>, power: Option<&str>) -> PowerQuery {
        PowerQuery {
            design,
            effect_size: Dec::parse(d).unwrap(),
            sample_size: n,
            power: power.map(|p| Dec::parse(p).unwrap()),
        }
    }

    fn alpha() -> Dec {
        Dec::parse("0.05").unwrap()
    }

    #[test]
    fn two_sample_power_reference_value() {
        // d = 0.5, n = 64 per group, alpha 0.05 two-sided: power ~ 0.80.
        let q = query(PowerDesign::TwoSample, "0.5", Some(64), None);
        let result = run(&q, &alpha(), Alternative::TwoSided, GuardianOutcome::Skipped).unwrap();
        let power = Dec::parse(&result.statistics["power"]).unwrap();
        assert!(power > Dec::parse("0.79").unwrap() && power < Dec::parse("0.82").unwrap());
    }

    #[test]
    fn solve_n_round_trip() {
        let q = query(PowerDesign::TwoSample, "0.5", None, Some("0.8"));
        let result = run(&q, &alpha(), Alternative::TwoSided, GuardianOutcome::Skipped).unwrap();
        let n: u64 = result.statistics["sample_size"].parse().unwrap();
        // Classic rule of thumb: ~63-64 per group.
        assert!((62..=65).contains(&n), "n = {n}");
        let achieved = Dec::parse(&result.statistics["achieved_power"]).unwrap();
        assert!(achieved >= Dec::parse("0.8").unwrap());
        // Minimality: one fewer observation misses the target.
        let smaller = achieved_power(
            &Dec::parse("0.5").unwrap(),
            n - 1,
            &Dec::from_int(2),
            &normal_quantile(&Dec::parse("0.975").unwrap()).unwrap(),
        )
        .unwrap();
        assert!(smaller < Dec::parse("0.8").unwrap());
    }

    #[test]
    fn one_sample_needs_fewer_observations() {
        let two = query(PowerDesign::TwoSample, "0.5", None, Some("0.8"));
        let one = query(PowerDesign::OneSample, "0.5", None, Some("0.8"));
        let n_two: u64 = run(&two, &alpha(), Alternative::TwoSided, GuardianOutcome::Skipped)
            .unwrap()
            .statistics["sample_size"]
            .parse()
            .unwrap();
        let n_one: u64 = run(&one, &alpha(), Alternative::TwoSided, GuardianOutcome::Skipped)
            .unwrap()
            .statistics["sample_size"]
            .parse()
            .unwrap();
        assert!(n_one < n_two);
    }

    #[test]
    fn zero_effect_is_degenerate() {
        let q = query(PowerDesign::TwoSample, "0", Some(30), None);
        assert!(matches!(
            run(&q, &alpha(), Alternative::TwoSided, GuardianOutcome::Skipped),
            Err(Error::DegenerateInput { .. })
        ));
    }

    #[test]
    fn one_sided_power_exceeds_two_sided() {
        let q = query(PowerDesign::TwoSample, "0.5", Some(50), None);
        let two = run(&q, &alpha(), Alternative::TwoSided, GuardianOutcome::Skipped).unwrap();
        let one = run(&q, &alpha(), Alternative::Greater, GuardianOutcome::Skipped).unwrap();
        let p_two = Dec::parse(&two.statistics["power"]).unwrap();
        let p_one = Dec::parse(&one.statistics["power"]).unwrap();
        assert!(p_one > p_two);
    }
}
