//! CDF and quantile evaluation for the classical test distributions.
//!
//! Quantiles are computed by bracketed bisection against the corresponding
//! CDF rather than by float-tuned polynomial approximations, so the result
//! is correct to the configured digit count. All brackets and bisection
//! loops have fixed iteration budgets.

use crate::ctx;
use crate::dec::{safe_div, Dec};
use crate::special::{erfc, inc_beta, inc_gamma_lower};
use sg_common::{Error, Result};

const BRACKET_MAX_DOUBLINGS: usize = 256;

fn domain_err(function: &str, parameter: &str, value: &Dec) -> Error {
    Error::Domain {
        function: function.into(),
        parameter: parameter.into(),
        value: crate::format::sig_string(value),
    }
}

fn require_positive(function: &str, parameter: &str, value: &Dec) -> Result<()> {
    if value.is_zero() || value.is_negative() {
        return Err(domain_err(function, parameter, value));
    }
    Ok(())
}

fn require_open_unit(function: &str, p: &Dec) -> Result<()> {
    if p.is_zero() || p.is_negative() || *p >= Dec::one() {
        return Err(domain_err(function, "p", p));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Normal
// ---------------------------------------------------------------------------

/// Standard normal CDF.
pub fn normal_cdf(z: &Dec) -> Result<Dec> {
    let sqrt2 = Dec::from_int(2).sqrt()?;
    let arg = safe_div(&(-z.clone()), &sqrt2, "sqrt(2)")?;
    Ok(erfc(&arg)?.halve())
}

/// Standard normal quantile for p in (0, 1).
pub fn normal_quantile(p: &Dec) -> Result<Dec> {
    require_open_unit("normal_quantile", p)?;
    let (lo, hi) = symmetric_bracket(normal_cdf, p, "normal_quantile")?;
    bisect(normal_cdf, lo, hi, p, "normal_quantile")
}

// ---------------------------------------------------------------------------
// Student t
// ---------------------------------------------------------------------------

/// Student-t CDF with df > 0 (fractional df supported, for Welch).
pub fn student_t_cdf(t: &Dec, df: &Dec) -> Result<Dec> {
    require_positive("student_t_cdf", "df", df)?;
    if t.is_zero() {
        return Ok(Dec::one().halve());
    }
    let t2 = t * t;
    let x = safe_div(df, &(df + &t2), "df + t^2")?;
    let half = Dec::one().halve();
    let half_df = df.halve();
    let tail = inc_beta(&x, &half_df, &half)?.halve();
    if t.is_negative() {
        Ok(tail)
    } else {
        Ok(&Dec::one() - &tail)
    }
}

/// Student-t quantile for p in (0, 1).
pub fn student_t_quantile(p: &Dec, df: &Dec) -> Result<Dec> {
    require_positive("student_t_quantile", "df", df)?;
    require_open_unit("student_t_quantile", p)?;
    let cdf = |t: &Dec| student_t_cdf(t, df);
    let (lo, hi) = symmetric_bracket(cdf, p, "student_t_quantile")?;
    bisect(cdf, lo, hi, p, "student_t_quantile")
}

// ---------------------------------------------------------------------------
// Chi-square
// ---------------------------------------------------------------------------

/// Chi-square CDF with df > 0.
pub fn chi_square_cdf(x: &Dec, df: &Dec) -> Result<Dec> {
    require_positive("chi_square_cdf", "df", df)?;
    if x.is_zero() || x.is_negative() {
        return Ok(Dec::zero());
    }
    inc_gamma_lower(&df.halve(), &x.halve())
}

/// Chi-square quantile for p in (0, 1).
pub fn chi_square_quantile(p: &Dec, df: &Dec) -> Result<Dec> {
    require_positive("chi_square_quantile", "df", df)?;
    require_open_unit("chi_square_quantile", p)?;
    let cdf = |x: &Dec| chi_square_cdf(x, df);
    let hi = upper_bracket(cdf, p, "chi_square_quantile")?;
    bisect(cdf, Dec::zero(), hi, p, "chi_square_quantile")
}

// ---------------------------------------------------------------------------
// Fisher F
// ---------------------------------------------------------------------------

/// F distribution CDF with df1, df2 > 0.
pub fn f_cdf(x: &Dec, df1: &Dec, df2: &Dec) -> Result<Dec> {
    require_positive("f_cdf", "df1", df1)?;
    require_positive("f_cdf", "df2", df2)?;
    if x.is_zero() || x.is_negative() {
        return Ok(Dec::zero());
    }
    let num = df1 * x;
    let u = safe_div(&num, &(&num + df2), "df1 x + df2")?;
    inc_beta(&u, &df1.halve(), &df2.halve())
}

/// F distribution quantile for p in (0, 1).
pub fn f_quantile(p: &Dec, df1: &Dec, df2: &Dec) -> Result<Dec> {
    require_positive("f_quantile", "df1", df1)?;
    require_positive("f_quantile", "df2", df2)?;
    require_open_unit("f_quantile", p)?;
    let cdf = |x: &Dec| f_cdf(x, df1, df2);
    let hi = upper_bracket(cdf, p, "f_quantile")?;
    bisect(cdf, Dec::zero(), hi, p, "f_quantile")
}

// ---------------------------------------------------------------------------
// Beta
// ---------------------------------------------------------------------------

/// Beta distribution CDF with a, b > 0 and x in [0, 1].
pub fn beta_cdf(x: &Dec, a: &Dec, b: &Dec) -> Result<Dec> {
    inc_beta(x, a, b)
}

/// Beta distribution quantile for p in (0, 1).
pub fn beta_quantile(p: &Dec, a: &Dec, b: &Dec) -> Result<Dec> {
    require_positive("beta_quantile", "a", a)?;
    require_positive("beta_quantile", "b", b)?;
    require_open_unit("beta_quantile", p)?;
    let cdf = |x: &Dec| beta_cdf(x, a, b);
    bisect(cdf, Dec::zero(), Dec::one(), p, "beta_quantile")
}

// ---------------------------------------------------------------------------
// Root finding
// ---------------------------------------------------------------------------

/// Expand [-1, 1] outward until it brackets the quantile.
fn symmetric_bracket<F>(cdf: F, p: &Dec, routine: &str) -> Result<(Dec, Dec)>
where
    F: Fn(&Dec) -> Result<Dec>,
{
    let two = Dec::from_int(2);
    let mut hi = Dec::one();
    let mut doublings = 0;
    while cdf(&hi)? < *p {
        hi = &hi * &two;
        doublings += 1;
        if doublings > BRACKET_MAX_DOUBLINGS {
            return Err(Error::Convergence {
                routine: routine.into(),
                max_iterations: BRACKET_MAX_DOUBLINGS,
            });
        }
    }
    let mut lo = Dec::from_int(-1);
    doublings = 0;
    while cdf(&lo)? > *p {
        lo = &lo * &two;
        doublings += 1;
        if doublings > BRACKET_MAX_DOUBLINGS {
            return Err(Error::Convergence {
                routine: routine.into(),
                max_iterations: BRACKET_MAX_DOUBLINGS,
            });
        }
    }
    Ok((lo, hi))
}

/// Expand (0, hi] until cdf(hi) >= p, for distributions on the positive axis.
fn upper_bracket<F>(cdf: F, p: &Dec, routine: &str) -> Result<Dec>
where
    F: Fn(&Dec) -> Result<Dec>,
{
    let two = Dec::from_int(2);
    let mut hi = Dec::one();
    let mut doublings = 0;
    while cdf(&hi)? < *p {
        hi = &hi * &two;
        doublings += 1;
        if doublings > BRACKET_MAX_DOUBLINGS {
            return Err(Error::Convergence {
                routine: routine.into(),
                max_iterations: BRACKET_MAX_DOUBLINGS,
            });
        }
    }
    Ok(hi)
}

/// Bisection with a fixed iteration budget derived from the digit count.
/// The bracket must satisfy cdf(lo) <= p <= cdf(hi).
fn bisect<F>(cdf: F, mut lo: Dec, mut hi: Dec, p: &Dec, routine: &str) -> Result<Dec>
where
    F: Fn(&Dec) -> Result<Dec>,
{
    let w = ctx::working_digits();
    // ~3.33 bisections per decimal digit, plus slack for the bracket span.
    let max_iter = (w as usize + 8) * 4;
    let mut mid = (&lo + &hi).halve();
    for _ in 0..max_iter {
        mid = (&lo + &hi).halve();
        let value = cdf(&mid)?;
        if value < *p {
            lo = mid.clone();
        } else {
            hi = mid.clone();
        }
        let width = (&hi - &lo).abs();
        let scale = lo.abs().max(hi.abs()).max(Dec::one());
        if !width.is_zero() && width.order() < scale.order() - (w as i64 + 4) {
            break;
        }
        if width.is_zero() {
            break;
        }
    }
    let _ = routine;
    Ok(mid)
}
