//! Exact combinatorics over big integers and rationals.
//!
//! The exact tests (Fisher, binomial) compute their p-values as exact
//! rationals and only convert to decimal at the very end, so no precision
//! is lost summing tail probabilities.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use sg_common::{Error, Result};

use crate::ctx;
use crate::dec::Dec;

/// n! as a big integer.
pub fn factorial(n: u64) -> BigInt {
    let mut acc = BigInt::one();
    for k in 2..=n {
        acc *= BigInt::from(k);
    }
    acc
}

/// Binomial coefficient C(n, k), multiplicative form.
pub fn binomial(n: u64, k: u64) -> BigInt {
    if k > n {
        return BigInt::zero();
    }
    let k = k.min(n - k);
    let mut num = BigInt::one();
    let mut den = BigInt::one();
    for i in 0..k {
        num *= BigInt::from(n - i);
        den *= BigInt::from(i + 1);
    }
    num / den
}

/// Hypergeometric pmf: probability of `k` successes in `n` draws from a
/// population of size `total` containing `success` successes.
pub fn hypergeometric_pmf(k: u64, success: u64, total: u64, n: u64) -> Result<BigRational> {
    if success > total || n > total {
        return Err(Error::Validation {
            field: "contingency_table".into(),
            reason: format!("inconsistent margins: success={success} n={n} total={total}"),
        });
    }
    let failure = total - success;
    if k > n || k > success || n - k > failure {
        return Ok(BigRational::zero());
    }
    let num = binomial(success, k) * binomial(failure, n - k);
    let den = binomial(total, n);
    Ok(BigRational::new(num, den))
}

/// Binomial pmf B(n, p) at `k`, with `p` an exact rational.
pub fn binomial_pmf(k: u64, n: u64, p: &BigRational) -> Result<BigRational> {
    if p.is_negative() || *p > BigRational::one() {
        return Err(Error::Validation {
            field: "probability".into(),
            reason: format!("probability {p} outside [0, 1]"),
        });
    }
    if k > n {
        return Ok(BigRational::zero());
    }
    let coeff = BigRational::from_integer(binomial(n, k));
    let q = BigRational::one() - p;
    Ok(coeff * p.pow(k as i32) * q.pow((n - k) as i32))
}

/// Convert an exact rational to [`Dec`] at the working precision.
pub fn rational_to_dec(r: &BigRational) -> Result<Dec> {
    let w = ctx::working_digits();
    let num = Dec::from_bigint(r.numer().clone());
    let den = Dec::from_bigint(r.denom().clone());
    num.checked_div(&den).ok_or(Error::DegenerateInput {
        quantity: "rational denominator".into(),
        detail: "denominator is zero".into(),
    })
    .map(|v| v.round_sig(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_factorials() {
        assert_eq!(factorial(0), BigInt::from(1));
        assert_eq!(factorial(5), BigInt::from(120));
        assert_eq!(factorial(20), BigInt::from(2_432_902_008_176_640_000_u64));
    }

    #[test]
    fn binomial_symmetry_and_edges() {
        assert_eq!(binomial(10, 3), BigInt::from(120));
        assert_eq!(binomial(10, 7), BigInt::from(120));
        assert_eq!(binomial(10, 0), BigInt::from(1));
        assert_eq!(binomial(3, 5), BigInt::from(0));
    }

    #[test]
    fn hypergeometric_sums_to_one() {
        // 2x2 table margins: total=10, success=4, draws=5.
        let mut sum = BigRational::zero();
        for k in 0..=5 {
            sum += hypergeometric_pmf(k, 4, 10, 5).unwrap();
        }
        assert_eq!(sum, BigRational::one());
    }

    #[test]
    fn binomial_pmf_fair_coin() {
        let half = BigRational::new(BigInt::from(1), BigInt::from(2));
        let pmf = binomial_pmf(2, 4, &half).unwrap();
        assert_eq!(pmf, BigRational::new(BigInt::from(6), BigInt::from(16)));
    }

    #[test]
    fn rational_conversion_matches_division() {
        let third = BigRational::new(BigInt::from(1), BigInt::from(3));
        let dec = rational_to_dec(&third).unwrap();
        assert!(dec.to_sig_string(10).starts_with("0.333333333"));
    }
}
