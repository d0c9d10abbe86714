//! Rank-based tests: Mann-Whitney U, Wilcoxon signed-rank, Kruskal-Wallis,
//! Friedman. Normal and chi-square approximations with tie corrections and,
//! for the two-sample statistics, a continuity correction.

use sg_common::{CanonicalResult, Error, GuardianOutcome, Result};
use sg_math::dist::{chi_square_cdf, normal_cdf};
use sg_math::{linalg, safe_div, sig_string, Dec};

use super::{p_from_cdf, put, upper_tail};
use crate::guardian::paired_differences;
use crate::model::{Alternative, Dataset, NonParametricKind};

pub(super) fn run(
    kind: &NonParametricKind,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    match kind {
        NonParametricKind::MannWhitneyU { sample_a, sample_b } => {
            mann_whitney(sample_a, sample_b, alternative, outcome)
        }
        NonParametricKind::WilcoxonSignedRank { sample_a, sample_b } => {
            wilcoxon(sample_a, sample_b, alternative, outcome)
        }
        NonParametricKind::KruskalWallis { groups } => kruskal_wallis(groups, outcome),
        NonParametricKind::Friedman { blocks } => friedman(blocks, outcome),
    }
}

/// Sum over tie groups of t^3 - t, the shared tie-correction term.
fn tie_term(groups: &[usize]) -> Dec {
    let mut acc = Dec::zero();
    for &t in groups {
        if t > 1 {
            let t_dec = Dec::from_usize(t);
            let cubed = &(&t_dec * &t_dec) * &t_dec;
            acc = &acc + &(&cubed - &t_dec);
        }
    }
    acc
}

/// Shift a deviation from the null mean half a unit toward zero.
fn continuity_correct(diff: &Dec) -> Dec {
    let half = Dec::one().halve();
    if diff.is_zero() {
        Dec::zero()
    } else if diff.is_negative() {
        let shifted = diff + &half;
        if shifted.is_negative() || shifted.is_zero() {
            shifted
        } else {
            Dec::zero()
        }
    } else {
        let shifted = diff - &half;
        if shifted.is_negative() {
            Dec::zero()
        } else {
            shifted
        }
    }
}

fn mann_whitney(
    sample_a: &Dataset,
    sample_b: &Dataset,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let n1 = sample_a.len();
    let n2 = sample_b.len();
    let total = n1 + n2;

    let mut combined = sample_a.clone();
    combined.extend(sample_b.iter().cloned());
    let (ranks, ties) = linalg::ranks(&combined);

    let r1 = ranks[..n1].iter().fold(Dec::zero(), |acc, v| &acc + v);
    let n1_dec = Dec::from_usize(n1);
    let n2_dec = Dec::from_usize(n2);
    let pairs = &n1_dec * &n2_dec;
    let u1 = &r1 - &Dec::from_usize(n1 * (n1 + 1)).halve();
    let u2 = &pairs - &u1;
    let u = if u1 < u2 { u1.clone() } else { u2.clone() };

    // Tie-corrected variance of U.
    let total_dec = Dec::from_usize(total);
    let mean = pairs.halve();
    let tie = tie_term(&ties);
    let denom = &total_dec * &(&total_dec - &Dec::one());
    let spread = &(&total_dec + &Dec::one()) - &safe_div(&tie, &denom, "N(N-1)")?;
    let variance = &safe_div(&pairs, &Dec::from_int(12), "12")? * &spread;
    if variance.is_zero() || variance.is_negative() {
        return Err(Error::DegenerateInput {
            quantity: "rank variance".into(),
            detail: "all observations are tied".into(),
        });
    }
    let sd = variance.sqrt()?;
    let z = safe_div(&continuity_correct(&(&u1 - &mean)), &sd, "rank standard deviation")?;
    let p = p_from_cdf(&normal_cdf(&z)?, alternative);

    let mut result = CanonicalResult::new("mann_whitney_u", outcome);
    put(&mut result.statistics, "u", &u);
    put(&mut result.statistics, "u1", &u1);
    put(&mut result.statistics, "u2", &u2);
    put(&mut result.statistics, "z", &z);
    result.p_value = sig_string(&p);
    // Rank-biserial correlation as the effect size.
    let rb = &safe_div(&(&Dec::from_int(2) * &u1), &pairs, "n1 n2")? - &Dec::one();
    put(&mut result.effect_sizes, "rank_biserial", &rb);
    Ok(result)
}

fn wilcoxon(
    sample_a: &Dataset,
    sample_b: &Dataset,
    alternative: Alternative,
    outcome: GuardianOutcome,
) -> Result<CanonicalResult> {
    let diffs = paired_differences(sample_a, sample_b)?;
    let nonzero: Vec<Dec> = diffs.into_iter().filter(|d| !d.is_zero()).collect();
    if nonzero.is_empty() {
        return Err(Error::DegenerateInput {
            quantity: "non-zero differences".into(),
            detail: "every pair is tied".into(),
        });
    }
    let n = nonzero.len();
    let magnitudes: Vec<Dec> = nonzero.iter().map(Dec::abs).collect();
    let (ranks, ties) = linalg::ranks(&magnitudes);

    let mut w_plus = Dec::zero();
    for (d, rank) in nonzero.iter().zip(ranks.iter()) {
        if !d.is_negative() {
            w_plus = &w_plus + rank;
        }
    }
    let n_dec = Dec::from_usize(n);
    let mean = Dec::from_usize(n * (n + 1)).halve().halve();
    let base = safe_div(
        &Dec::from_usize(n * (n + 1) * (2 * n + 1)),
        &Dec::from_int(24),
        "24",
    )?;
    let tie_adjust = safe_div(&tie_term(&ties), &Dec::from_int(48), "48")?;
    let variance = &base - &tie_adjust;
    if variance.is_zero() || variance.is_negative() {
        return Err(Error::DegenerateInput {
            quantity: "rank variance".into(),
            detail: "all difference magnitudes are tied".into(),
        });
    }
    let sd = variance.sqrt()?;
    let z = safe_div(&continuity_correct(&(&w_plus - &mean)), &sd, "rank standard deviation")?;
    let p = p_from_cdf(&normal_cdf(&z)?, alternative);

    let w_minus = &Dec::from_usize(n * (n + 1)).halve() - &w_plus;
    let w = if w_plus < w_minus {
        w_plus.clone()
    } else {
        w_minus.clone()
    };
    let mut result = CanonicalResult::new("wilcoxon_signed_rank", outcome);
    put(&mut result.statistics, "w", &w);
    put(&mut result.statistics, "w_plus", &w_plus);
    put(&mut result.statistics, "w_minus", &w_minus);
    put(&mut result.statistics, "z", &z);
    put(&mut result.statistics, "n_used", &n_dec);
    result.p_value = sig_string(&p);
    Ok(result)
}

fn kruskal_wallis(groups: &[Dataset], outcome: GuardianOutcome) -> Result<CanonicalResult> {
    let k = groups.len();
    if k < 2 {
        return Err(Error::Validation {
            field: "groups".into(),
            reason: format!("need at least 2 groups, got {k}"),
        });
    }
    let total: usize = groups.iter().map(Vec::len).sum();
    let pooled: Vec<Dec> = groups.iter().flatten().cloned().collect();
    let (ranks, ties) = linalg::ranks(&pooled);

    let total_dec = Dec::from_usize(total);
    let n_plus_one = &total_dec + &Dec::one();
    let mut offset = 0;
    let mut rank_sum_sq = Dec::zero();
    for group in groups {
        let sum = ranks[offset..offset + group.len()]
            .iter()
            .fold(Dec::zero(), |acc, v| &acc + v);
        offset += group.len();
        rank_sum_sq =
            &rank_sum_sq + &safe_div(&(&sum * &sum), &Dec::from_usize(group.len()), "group size")?;
    }
    let scale = safe_div(
        &Dec::from_int(12),
        &(&total_dec * &n_plus_one),
        "N(N+1)",
    )?;
    let h_raw = &(&scale * &rank_sum_sq) - &(&Dec::from_int(3) * &n_plus_one);

    // Tie correction: divide by 1 - sum(t^3 - t) / (N^3 - N).
    let cubed = &(&total_dec * &total_dec) * &total_dec;
    let correction = &Dec::one() - &safe_div(&tie_term(&ties), &(&cubed - &total_dec), "N^3 - N")?;
    if correction.is_zero() || correction.is_negative() {
        return Err(Error::DegenerateInput {
            quantity: "tie correction".into(),
            detail: "all observations are tied".into(),
        });
    }
    let h = safe_div(&h_raw, &correction, "tie correction")?;
    let df = Dec::from_usize(k - 1);
    let p = upper_tail(&chi_square_cdf(&h, &df)?);

    let mut result = CanonicalResult::new("kruskal_wallis", outcome);
    put(&mut result.statistics, "h", &h);
    put(&mut result.statistics, "df", &df);
    result.p_value = sig_string(&p);
    Ok(result)
}

fn friedman(blocks: &[Dataset], outcome: GuardianOutcome) -> Result<CanonicalResult> {
    let b = blocks.len();
    let k = blocks.first().map(Vec::len).unwrap_or(0);
    if b < 2 || k < 2 {
        return Err(Error::Validation {
            field: "blocks".into(),
            reason: format!("need at least 2 blocks of at least 2 treatments, got {b}x{k}"),
        });
    }
    if blocks.iter().any(|row| row.len() != k) {
        return Err(Error::Validation {
            field: "blocks".into(),
            reason: "every block must contain the same number of treatments".into(),
        });
    }

    // Rank within each block; accumulate per-treatment rank sums.
    let mut treatment_sums = vec![Dec::zero(); k];
    let mut tie_total = Dec::zero();
    for block in blocks {
        let (ranks, ties) = linalg::ranks(block);
        for (sum, rank) in treatment_sums.iter_mut().zip(ranks.iter()) {
            *sum = &*sum + rank;
        }
        tie_total = &tie_total + &tie_term(&ties);
    }

    let b_dec = Dec::from_usize(b);
    let k_dec = Dec::from_usize(k);
    let k_plus_one = &k_dec + &Dec::one();
    let mut sum_sq = Dec::zero();
    for sum in &treatment_sums {
        sum_sq = &sum_sq + &(sum * sum);
    }
    let scale = safe_div(
        &Dec::from_int(12),
        &(&(&b_dec * &k_dec) * &k_plus_one),
        "b k (k+1)",
    )?;
    let chi_raw = &(&scale * &sum_sq) - &(&(&Dec::from_int(3) * &b_dec) * &k_plus_one);

    // Tie correction over blocks: 1 - sum(t^3 - t) / (b k (k^2 - 1)).
    let k_sq_minus_one = &(&k_dec * &k_dec) - &Dec::one();
    let correction = &Dec::one()
        - &safe_div(
            &tie_total,
            &(&(&b_dec * &k_dec) * &k_sq_minus_one),
            "b k (k^2 - 1)",
        )?;
    if correction.is_zero() || correction.is_negative() {
        return Err(Error::DegenerateInput {
            quantity: "tie correction".into(),
            detail: "every block is fully tied".into(),
        });
    }
    let chi = safe_div(&chi_raw, &correction, "tie correction")?;
    let df = Dec::from_usize(k - 1);
    let p = upper_tail(&chi_square_cdf(&chi, &df)?);

    let mut result = CanonicalResult::new("friedman", outcome);
    put(&mut result.statistics, "chi_square", &chi);
    put(&mut result.statistics, "df", &df);
    result.p_value = sig_string(&p);
    Ok(result)
}
