//! Elementary transcendental functions over [`Dec`].
//!
//! `exp` uses argument halving plus a Taylor series; `ln` uses square-root
//! reduction followed by the atanh series; π comes from Machin's formula.
//! Every series is bounded by an explicit iteration cap and reports
//! `Convergence` on exhaustion instead of spinning. Constants are cached per
//! working digit count.

use crate::ctx;
use crate::dec::{safe_div, Dec};
use sg_common::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

const SERIES_MAX_ITERS: usize = 100_000;

/// Shared constants for one working digit count.
pub struct Constants {
    pub pi: Dec,
    pub ln10: Dec,
}

fn cache() -> &'static Mutex<HashMap<u64, Arc<Constants>>> {
    static CACHE: OnceLock<Mutex<HashMap<u64, Arc<Constants>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Constants at the current working precision.
pub fn constants() -> Result<Arc<Constants>> {
    let key = ctx::working_digits();
    if let Ok(guard) = cache().lock() {
        if let Some(c) = guard.get(&key) {
            return Ok(Arc::clone(c));
        }
    }
    let computed = Arc::new(Constants {
        pi: compute_pi()?,
        ln10: compute_ln10()?,
    });
    if let Ok(mut guard) = cache().lock() {
        guard.entry(key).or_insert_with(|| Arc::clone(&computed));
    }
    Ok(computed)
}

/// π at the current working precision.
pub fn pi() -> Result<Dec> {
    Ok(constants()?.pi.clone())
}

/// ln 10 at the current working precision.
pub fn ln10() -> Result<Dec> {
    Ok(constants()?.ln10.clone())
}

/// Machin's formula: π = 16·atan(1/5) − 4·atan(1/239).
fn compute_pi() -> Result<Dec> {
    let a = atan_inv(5)?;
    let b = atan_inv(239)?;
    let sixteen = Dec::from_int(16);
    let four = Dec::from_int(4);
    Ok(&(&sixteen * &a) - &(&four * &b))
}

/// atan(1/k) by its Taylor series; k ≥ 2 keeps convergence geometric.
fn atan_inv(k: i64) -> Result<Dec> {
    let eps = Dec::eps(5);
    let k_dec = Dec::from_int(k);
    let inv_k2 = safe_div(&Dec::one(), &(&k_dec * &k_dec), "k^2")?;
    let mut power = safe_div(&Dec::one(), &k_dec, "k")?;
    let mut sum = power.clone();
    let mut negative = true;
    for n in 1..=SERIES_MAX_ITERS {
        power = &power * &inv_k2;
        let term = safe_div(&power, &Dec::from_int(2 * n as i64 + 1), "series index")?;
        if term.abs() < eps {
            return Ok(sum);
        }
        sum = if negative { &sum - &term } else { &sum + &term };
        negative = !negative;
    }
    Err(Error::Convergence {
        routine: "atan_inv".into(),
        max_iterations: SERIES_MAX_ITERS,
    })
}

/// ln 10 = 3·ln 2 + ln 1.25 (10 = 2³ · 1.25).
fn compute_ln10() -> Result<Dec> {
    let ln2 = ln_core(&Dec::from_int(2))?;
    let ln_five_fourths = ln_core(&Dec::from_parts(125.into(), -2))?;
    Ok(&(&Dec::from_int(3) * &ln2) + &ln_five_fourths)
}

/// ln for arguments of moderate magnitude, via repeated square roots until
/// the argument is near 1, then the atanh series:
/// ln x = 2^k · 2·atanh((s−1)/(s+1)).
fn ln_core(x: &Dec) -> Result<Dec> {
    let one = Dec::one();
    let eps = Dec::eps(5);
    // Reduce until |s - 1| <= 1/16.
    let close = Dec::from_parts(625.into(), -4);
    let mut s = x.clone();
    let mut halvings: i64 = 0;
    for _ in 0..128 {
        if (&s - &one).abs() <= close {
            break;
        }
        s = s.sqrt()?;
        halvings += 1;
    }
    let u = safe_div(&(&s - &one), &(&s + &one), "s + 1")?;
    let u2 = &u * &u;
    let mut power = u.clone();
    let mut sum = u.clone();
    for n in 1..=SERIES_MAX_ITERS {
        power = &power * &u2;
        let term = safe_div(&power, &Dec::from_int(2 * n as i64 + 1), "series index")?;
        sum = &sum + &term;
        if term.abs() < eps {
            let doubled = Dec::from_int(2).powi(halvings + 1).ok_or(Error::Convergence {
                routine: "ln_core".into(),
                max_iterations: SERIES_MAX_ITERS,
            })?;
            return Ok(&doubled * &sum);
        }
    }
    Err(Error::Convergence {
        routine: "ln_core".into(),
        max_iterations: SERIES_MAX_ITERS,
    })
}

/// Natural logarithm. Domain: x > 0.
pub fn ln(x: &Dec) -> Result<Dec> {
    if x.is_zero() || x.is_negative() {
        return Err(Error::Domain {
            function: "ln".into(),
            parameter: "x".into(),
            value: crate::format::sig_string(x),
        });
    }
    // x = m * 10^adj with m in [1, 10).
    let adj = x.order() - 1;
    let m = Dec::from_parts(x.clone().into_parts().0, -(x.digits() as i64 - 1));
    let ln_m = ln_core(&m)?;
    if adj == 0 {
        return Ok(ln_m);
    }
    Ok(&ln_m + &(&Dec::from_int(adj) * &ln10()?))
}

/// Exponential function: halving reduction plus Taylor series.
pub fn exp(x: &Dec) -> Result<Dec> {
    if x.is_zero() {
        return Ok(Dec::one());
    }
    // Halve until |r| < 1/2: 2^m > 2|x| with m ≈ 3.33 digits of |x|.
    let order = x.order();
    let m: i64 = if order < 0 { 0 } else { (order + 1) * 4 + 1 };
    let reducer = Dec::from_int(2).powi(m).ok_or(Error::Convergence {
        routine: "exp".into(),
        max_iterations: SERIES_MAX_ITERS,
    })?;
    let r = safe_div(x, &reducer, "2^m")?;

    let eps = Dec::eps(5);
    let mut term = Dec::one();
    let mut sum = Dec::one();
    let mut converged = false;
    for n in 1..=SERIES_MAX_ITERS {
        term = safe_div(&(&term * &r), &Dec::from_int(n as i64), "series index")?;
        sum = &sum + &term;
        if term.abs() < eps {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(Error::Convergence {
            routine: "exp".into(),
            max_iterations: SERIES_MAX_ITERS,
        });
    }
    for _ in 0..m {
        sum = &sum * &sum;
    }
    Ok(sum)
}

/// General power x^y. Integer exponents are exact binary exponentiation;
/// otherwise x must be positive and x^y = exp(y ln x).
pub fn pow(x: &Dec, y: &Dec) -> Result<Dec> {
    if let Some(n) = y.to_i64() {
        if x.is_zero() && n <= 0 {
            return Err(Error::Domain {
                function: "pow".into(),
                parameter: "exponent".into(),
                value: n.to_string(),
            });
        }
        return x.powi(n).ok_or(Error::Domain {
            function: "pow".into(),
            parameter: "exponent".into(),
            value: n.to_string(),
        });
    }
    if x.is_zero() {
        return Ok(Dec::zero());
    }
    if x.is_negative() {
        return Err(Error::Domain {
            function: "pow".into(),
            parameter: "base".into(),
            value: crate::format::sig_string(x),
        });
    }
    exp(&(y * &ln(x)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        Dec::parse(s).unwrap()
    }

    #[test]
    fn pi_to_forty_digits() {
        let value = pi().unwrap();
        assert!(value
            .to_sig_string(40)
            .starts_with("3.14159265358979323846264338327950288419"));
    }

    #[test]
    fn ln10_known_prefix() {
        let value = ln10().unwrap();
        assert!(value.to_sig_string(20).starts_with("2.302585092994045684"));
    }

    #[test]
    fn exp_and_ln_are_inverse() {
        let x = dec("3.25");
        let back = ln(&exp(&x).unwrap()).unwrap();
        let diff = (&back - &x).abs();
        assert!(diff < dec("1e-52"), "ln(exp(3.25)) residual {diff}");
    }

    #[test]
    fn exp_one_is_e() {
        let e = exp(&Dec::one()).unwrap();
        assert!(e
            .to_sig_string(30)
            .starts_with("2.71828182845904523536028747135"));
    }

    #[test]
    fn ln_rejects_nonpositive() {
        assert!(ln(&Dec::zero()).is_err());
        assert!(ln(&dec("-2")).is_err());
    }

    #[test]
    fn exp_of_large_negative_underflows_gracefully() {
        let value = exp(&dec("-1000")).unwrap();
        assert!(!value.is_zero());
        assert!(value.order() < -400);
    }

    #[test]
    fn pow_integer_and_fractional() {
        assert_eq!(pow(&dec("2"), &dec("10")).unwrap(), dec("1024"));
        let root = pow(&dec("2"), &dec("0.5")).unwrap();
        assert!(root.to_sig_string(20).starts_with("1.414213562373095048"));
        assert!(pow(&dec("-2"), &dec("0.5")).is_err());
    }

    #[test]
    fn identical_inputs_identical_strings() {
        let a = exp(&dec("1.5")).unwrap().to_sig_string(50);
        let b = exp(&dec("1.5")).unwrap().to_sig_string(50);
        assert_eq!(a, b);
    }
}
