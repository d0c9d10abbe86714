//! Fixed-precision decimal numbers.
//!
//! [`Dec`] is a sign-carrying `BigInt` mantissa scaled by a power of ten.
//! Arithmetic rounds results to the working digit count (configured
//! precision plus guard digits, see [`crate::ctx`]) using round-half-even.
//! Values never pass through a native floating-point type: parsing, every
//! operation, and formatting are all exact decimal manipulations, which is
//! what makes results reproducible bit-for-bit across platforms.

use crate::ctx;
use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use sg_common::{Error, Result};
use std::cmp::Ordering;
use std::ops::{Add, Mul, Neg, Sub};

/// A decimal value `mant * 10^exp`, normalized so the mantissa carries no
/// trailing zeros (zero itself is stored as `0 * 10^0`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dec {
    mant: BigInt,
    exp: i64,
}

fn pow10(k: u64) -> BigInt {
    BigInt::from(10u32).pow(
        u32::try_from(k).unwrap_or(u32::MAX), // mantissa sizes keep k small
    )
}

/// Decimal digit count of a non-negative magnitude.
fn digit_len(n: &BigInt) -> u64 {
    if n.is_zero() {
        return 0;
    }
    n.magnitude().to_str_radix(10).len() as u64
}

impl Dec {
    pub fn zero() -> Self {
        Dec {
            mant: BigInt::zero(),
            exp: 0,
        }
    }

    pub fn one() -> Self {
        Dec {
            mant: BigInt::one(),
            exp: 0,
        }
    }

    pub fn from_int(v: i64) -> Self {
        Dec {
            mant: BigInt::from(v),
            exp: 0,
        }
        .normalized()
    }

    pub fn from_usize(v: usize) -> Self {
        Dec {
            mant: BigInt::from(v),
            exp: 0,
        }
        .normalized()
    }

    pub fn from_bigint(mant: BigInt) -> Self {
        Dec { mant, exp: 0 }.normalized()
    }

    /// Build `mant * 10^exp` directly (normalized).
    pub fn from_parts(mant: BigInt, exp: i64) -> Self {
        Dec { mant, exp }.normalized()
    }

    /// One unit in the `working + extra`-th decimal place; used as a series
    /// convergence threshold.
    pub(crate) fn eps(extra: u64) -> Self {
        let shift = ctx::working_digits() + extra;
        Dec {
            mant: BigInt::one(),
            exp: -(shift as i64),
        }
    }

    /// Parse an exact decimal literal: optional sign, digits, optional
    /// fraction, optional `e`/`E` exponent. Never routes through a float.
    pub fn parse(input: &str) -> std::result::Result<Dec, String> {
        let s = input.trim();
        if s.is_empty() {
            return Err("empty numeric literal".into());
        }
        let (sign, rest) = match s.as_bytes()[0] {
            b'+' => (1, &s[1..]),
            b'-' => (-1, &s[1..]),
            _ => (1, s),
        };
        let (digits_part, exp_part) = match rest.find(['e', 'E']) {
            Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
            None => (rest, None),
        };
        let mut mant_digits = String::with_capacity(digits_part.len());
        let mut frac_len: i64 = 0;
        let mut seen_point = false;
        let mut seen_digit = false;
        for ch in digits_part.chars() {
            match ch {
                '0'..='9' => {
                    mant_digits.push(ch);
                    seen_digit = true;
                    if seen_point {
                        frac_len += 1;
                    }
                }
                '.' if !seen_point => seen_point = true,
                _ => return Err(format!("invalid numeric literal `{input}`")),
            }
        }
        if !seen_digit {
            return Err(format!("invalid numeric literal `{input}`"));
        }
        let exp_shift: i64 = match exp_part {
            Some(e) if !e.is_empty() => e
                .parse::<i64>()
                .map_err(|_| format!("invalid exponent in `{input}`"))?,
            Some(_) => return Err(format!("invalid exponent in `{input}`")),
            None => 0,
        };
        let mant: BigInt = mant_digits
            .parse()
            .map_err(|_| format!("invalid numeric literal `{input}`"))?;
        let mant = if sign < 0 { -mant } else { mant };
        Ok(Dec {
            mant,
            exp: exp_shift - frac_len,
        }
        .normalized())
    }

    fn normalized(mut self) -> Self {
        if self.mant.is_zero() {
            self.exp = 0;
            return self;
        }
        // Strip trailing zeros from the mantissa in chunks.
        let chunk = BigInt::from(1_000_000_000u64);
        loop {
            let (q, r) = self.mant.div_rem(&chunk);
            if r.is_zero() && !q.is_zero() {
                self.mant = q;
                self.exp += 9;
            } else {
                break;
            }
        }
        let ten = BigInt::from(10u32);
        loop {
            let (q, r) = self.mant.div_rem(&ten);
            if r.is_zero() && !q.is_zero() {
                self.mant = q;
                self.exp += 1;
            } else {
                break;
            }
        }
        self
    }

    pub fn is_zero(&self) -> bool {
        self.mant.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.mant.is_negative()
    }

    pub fn abs(&self) -> Dec {
        Dec {
            mant: self.mant.abs(),
            exp: self.exp,
        }
    }

    /// Significant digits in the mantissa (0 for zero).
    pub fn digits(&self) -> u64 {
        digit_len(&self.mant)
    }

    /// Decimal order of magnitude: `floor(log10 |x|) + 1`, `i64::MIN` for
    /// zero. `order(999) == 3`, `order(0.01) == -1`.
    pub fn order(&self) -> i64 {
        if self.is_zero() {
            return i64::MIN;
        }
        self.exp + self.digits() as i64
    }

    /// Round to `digits` significant digits, half-even.
    pub fn round_sig(&self, digits: u64) -> Dec {
        debug_assert!(digits > 0);
        let nd = self.digits();
        if nd <= digits {
            return self.clone();
        }
        let drop = nd - digits;
        let scale = pow10(drop);
        let (mut q, r) = self.mant.magnitude().div_rem(scale.magnitude());
        let twice_r: num_bigint::BigUint = r << 1u32;
        match twice_r.cmp(scale.magnitude()) {
            Ordering::Greater => q += 1u32,
            Ordering::Equal => {
                if q.is_odd() {
                    q += 1u32;
                }
            }
            Ordering::Less => {}
        }
        let mant = BigInt::from_biguint(self.mant.sign(), q);
        Dec {
            mant,
            exp: self.exp + drop as i64,
        }
        .normalized()
    }

    fn round_working(self) -> Dec {
        let w = ctx::working_digits();
        if self.digits() > w {
            self.round_sig(w)
        } else {
            self
        }
    }

    fn add_impl(&self, rhs: &Dec) -> Dec {
        if self.is_zero() {
            return rhs.clone().round_working();
        }
        if rhs.is_zero() {
            return self.clone().round_working();
        }
        let w = ctx::working_digits() as i64;
        let (hi, lo) = if self.order() >= rhs.order() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        // The smaller operand is below the rounding horizon of the larger:
        // it cannot move any retained digit.
        if hi.order() - lo.order() > w + 2 {
            return hi.clone().round_working();
        }
        let common = hi.exp.min(lo.exp);
        let m = &hi.mant * pow10((hi.exp - common) as u64)
            + &lo.mant * pow10((lo.exp - common) as u64);
        Dec { mant: m, exp: common }.normalized().round_working()
    }

    fn mul_impl(&self, rhs: &Dec) -> Dec {
        if self.is_zero() || rhs.is_zero() {
            return Dec::zero();
        }
        Dec {
            mant: &self.mant * &rhs.mant,
            exp: self.exp + rhs.exp,
        }
        .normalized()
        .round_working()
    }

    /// Division at working precision. `None` when `rhs` is zero.
    pub fn checked_div(&self, rhs: &Dec) -> Option<Dec> {
        if rhs.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(Dec::zero());
        }
        let w = ctx::working_digits();
        let want = w + 2;
        let na = self.digits();
        let nb = rhs.digits();
        let scale = (want + nb).saturating_sub(na);
        let num = self.mant.magnitude() * pow10(scale).magnitude();
        let den = rhs.mant.magnitude();
        let (mut q, r) = num.div_rem(den);
        let twice_r: num_bigint::BigUint = r << 1u32;
        match twice_r.cmp(den) {
            Ordering::Greater => q += 1u32,
            Ordering::Equal => {
                if q.is_odd() {
                    q += 1u32;
                }
            }
            Ordering::Less => {}
        }
        let sign = self.mant.sign() * rhs.mant.sign();
        let mant = BigInt::from_biguint(sign, q);
        Some(
            Dec {
                mant,
                exp: self.exp - scale as i64 - rhs.exp,
            }
            .normalized()
            .round_working(),
        )
    }

    /// Multiply by 1/2 (exact apart from working rounding).
    pub fn halve(&self) -> Dec {
        Dec {
            mant: &self.mant * BigInt::from(5u32),
            exp: self.exp - 1,
        }
        .normalized()
        .round_working()
    }

    /// Integer power by binary exponentiation. `powi(0, 0) == 1`.
    pub fn powi(&self, n: i64) -> Option<Dec> {
        if n < 0 {
            return Dec::one().checked_div(&self.powi(-n)?);
        }
        let mut result = Dec::one();
        let mut base = self.clone();
        let mut e = n as u64;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            e >>= 1;
            if e > 0 {
                base = &base * &base;
            }
        }
        Some(result)
    }

    /// Square root via integer Newton on a scaled mantissa.
    pub fn sqrt(&self) -> Result<Dec> {
        if self.is_negative() {
            return Err(Error::Domain {
                function: "sqrt".into(),
                parameter: "x".into(),
                value: crate::format::sig_string(self),
            });
        }
        if self.is_zero() {
            return Ok(Dec::zero());
        }
        let w = ctx::working_digits();
        let nd = self.digits();
        let mut scale = (2 * (w + 2)).saturating_sub(nd);
        if (self.exp - scale as i64) % 2 != 0 {
            scale += 1;
        }
        let scaled = self.mant.magnitude() * pow10(scale).magnitude();
        let root = scaled.sqrt();
        Ok(Dec {
            mant: BigInt::from_biguint(num_bigint::Sign::Plus, root),
            exp: (self.exp - scale as i64) / 2,
        }
        .normalized()
        .round_working())
    }

    /// Decompose into mantissa and exponent.
    pub fn into_parts(self) -> (BigInt, i64) {
        (self.mant, self.exp)
    }

    /// The exact `BigInt` value, when this decimal is an integer.
    pub fn as_integer(&self) -> Option<BigInt> {
        if self.exp >= 0 {
            if self.exp > 10_000 {
                return None; // absurdly large integer, refuse to materialize
            }
            Some(&self.mant * pow10(self.exp as u64))
        } else {
            None
        }
    }

    /// Exact rational value. Decimal values are always rational.
    pub fn to_rational(&self) -> BigRational {
        if self.exp >= 0 {
            BigRational::from_integer(&self.mant * pow10(self.exp as u64))
        } else {
            BigRational::new(self.mant.clone(), pow10((-self.exp) as u64))
        }
    }

    /// Exact small-integer value, if representable.
    pub fn to_i64(&self) -> Option<i64> {
        self.as_integer().and_then(|b| b.to_i64())
    }

    /// Numeric comparison (total order; exact, no rounding).
    pub fn cmp_val(&self, rhs: &Dec) -> Ordering {
        match (self.mant.sign(), rhs.mant.sign()) {
            (num_bigint::Sign::Minus, num_bigint::Sign::NoSign | num_bigint::Sign::Plus) => {
                return Ordering::Less
            }
            (num_bigint::Sign::NoSign | num_bigint::Sign::Plus, num_bigint::Sign::Minus) => {
                return Ordering::Greater
            }
            (num_bigint::Sign::NoSign, num_bigint::Sign::NoSign) => return Ordering::Equal,
            (num_bigint::Sign::NoSign, num_bigint::Sign::Plus) => return Ordering::Less,
            (num_bigint::Sign::Plus, num_bigint::Sign::NoSign) => return Ordering::Greater,
            _ => {}
        }
        // Same nonzero sign: compare magnitudes by order first.
        let negative = self.is_negative();
        let ord = match self.order().cmp(&rhs.order()) {
            Ordering::Equal => {
                let shift_a = (self.exp - self.exp.min(rhs.exp)) as u64;
                let shift_b = (rhs.exp - self.exp.min(rhs.exp)) as u64;
                let a = self.mant.magnitude() * pow10(shift_a).magnitude();
                let b = rhs.mant.magnitude() * pow10(shift_b).magnitude();
                a.cmp(&b)
            }
            other => other,
        };
        if negative {
            ord.reverse()
        } else {
            ord
        }
    }
}

impl Ord for Dec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_val(other)
    }
}

impl PartialOrd for Dec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for Dec {
    fn from(v: i64) -> Self {
        Dec::from_int(v)
    }
}

impl Add for &Dec {
    type Output = Dec;
    fn add(self, rhs: &Dec) -> Dec {
        self.add_impl(rhs)
    }
}

impl Sub for &Dec {
    type Output = Dec;
    fn sub(self, rhs: &Dec) -> Dec {
        self.add_impl(&rhs.clone().neg())
    }
}

impl Mul for &Dec {
    type Output = Dec;
    fn mul(self, rhs: &Dec) -> Dec {
        self.mul_impl(rhs)
    }
}

impl Neg for Dec {
    type Output = Dec;
    fn neg(self) -> Dec {
        Dec {
            mant: -self.mant,
            exp: self.exp,
        }
    }
}

impl Add for Dec {
    type Output = Dec;
    fn add(self, rhs: Dec) -> Dec {
        (&self).add(&rhs)
    }
}

impl Sub for Dec {
    type Output = Dec;
    fn sub(self, rhs: Dec) -> Dec {
        (&self).sub(&rhs)
    }
}

impl Mul for Dec {
    type Output = Dec;
    fn mul(self, rhs: Dec) -> Dec {
        (&self).mul(&rhs)
    }
}

impl std::fmt::Display for Dec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", crate::format::sig_string(self))
    }
}

/// Division that reports a vanished denominator as a degenerate input.
pub fn safe_div(num: &Dec, den: &Dec, quantity: &str) -> Result<Dec> {
    num.checked_div(den).ok_or_else(|| Error::DegenerateInput {
        quantity: quantity.into(),
        detail: "division by zero".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        Dec::parse(s).unwrap()
    }

    #[test]
    fn parse_round_trips_exactly() {
        assert_eq!(dec("1.25"), Dec::from_parts(BigInt::from(125), -2));
        assert_eq!(dec("-0.001"), Dec::from_parts(BigInt::from(-1), -3));
        assert_eq!(dec("3e4"), Dec::from_parts(BigInt::from(3), 4));
        assert_eq!(dec("120"), Dec::from_parts(BigInt::from(12), 1));
        assert_eq!(dec(" 42 "), Dec::from_int(42));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Dec::parse("").is_err());
        assert!(Dec::parse("abc").is_err());
        assert!(Dec::parse("1.2.3").is_err());
        assert!(Dec::parse("1e").is_err());
        assert!(Dec::parse(".").is_err());
    }

    #[test]
    fn arithmetic_basics() {
        assert_eq!(&dec("1.5") + &dec("2.25"), dec("3.75"));
        assert_eq!(&dec("1") - &dec("0.999"), dec("0.001"));
        assert_eq!(&dec("0.2") * &dec("0.2"), dec("0.04"));
        assert_eq!(dec("7").checked_div(&dec("2")), Some(dec("3.5")));
        assert!(dec("1").checked_div(&Dec::zero()).is_none());
    }

    #[test]
    fn division_carries_fifty_plus_digits() {
        let third = dec("1").checked_div(&dec("3")).unwrap();
        let s = third.to_sig_string(50);
        assert_eq!(s.len(), 52); // "0." + 50 threes
        assert!(s.starts_with("0.33333333333333333333"));
    }

    #[test]
    fn round_half_even() {
        assert_eq!(dec("1.25").round_sig(2), dec("1.2"));
        assert_eq!(dec("1.35").round_sig(2), dec("1.4"));
        assert_eq!(dec("1.251").round_sig(2), dec("1.3"));
        assert_eq!(dec("999.9").round_sig(3), dec("1000"));
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(dec("-1") < dec("0.0001"));
        assert!(dec("0.1") < dec("0.2"));
        assert!(dec("10") > dec("9.999999"));
        assert_eq!(dec("1.10").cmp(&dec("1.1")), Ordering::Equal);
        assert!(dec("-0.2") < dec("-0.1"));
    }

    #[test]
    fn order_of_magnitude() {
        assert_eq!(dec("999").order(), 3);
        assert_eq!(dec("0.01").order(), -1);
        assert_eq!(dec("1").order(), 1);
    }

    #[test]
    fn sqrt_matches_known_values() {
        let root = dec("2").sqrt().unwrap();
        // sqrt(2) correctly rounded to 40 significant digits.
        assert_eq!(
            root.to_sig_string(40),
            "1.41421356237309504880168872420969807857"
        );
        assert!(dec("-1").sqrt().is_err());
        assert!(dec("0").sqrt().unwrap().is_zero());
        assert_eq!(dec("6.25").sqrt().unwrap(), dec("2.5"));
    }

    #[test]
    fn powi_small_cases() {
        assert_eq!(dec("2").powi(10).unwrap(), dec("1024"));
        assert_eq!(dec("10").powi(-2).unwrap(), dec("0.01"));
        assert_eq!(dec("5").powi(0).unwrap(), Dec::one());
    }

    #[test]
    fn rational_view_is_exact() {
        let r = dec("0.75").to_rational();
        assert_eq!(r, BigRational::new(BigInt::from(3), BigInt::from(4)));
    }

    #[test]
    fn far_apart_addition_keeps_dominant_term() {
        let big = dec("1e100");
        let tiny = dec("1e-100");
        assert_eq!(&big + &tiny, big);
    }
}
