//! Result formatting: high-precision values to stable decimal strings.
//!
//! Formatting rounds to a significant digit count and renders the decimal
//! directly from the mantissa; a native float never appears anywhere in the
//! path. Plain notation is used for moderate magnitudes, scientific notation
//! otherwise. The formatter holds no state, so repeated formatting of the
//! same value is byte-identical.

use crate::ctx;
use crate::dec::Dec;

/// Format at the currently configured precision.
pub fn sig_string(value: &Dec) -> String {
    value.to_sig_string(u64::from(ctx::current_precision()))
}

impl Dec {
    /// Render with at most `digits` significant digits (trailing zeros
    /// stripped), half-even rounding.
    pub fn to_sig_string(&self, digits: u64) -> String {
        let rounded = self.round_sig(digits.max(1));
        if rounded.is_zero() {
            return "0".to_string();
        }
        let (mant_str, exp) = rounded.mantissa_abs_string();
        let len = mant_str.len() as i64;
        // Scientific exponent of the value: first digit is 10^adj.
        let adj = exp + len - 1;
        let sign = if rounded.is_negative() { "-" } else { "" };

        if adj >= -6 && adj < digits as i64 + 6 {
            let body = if exp >= 0 {
                let mut s = mant_str;
                s.extend(std::iter::repeat_n('0', exp as usize));
                s
            } else {
                let point = len + exp;
                if point > 0 {
                    let (int_part, frac_part) = mant_str.split_at(point as usize);
                    if frac_part.is_empty() {
                        int_part.to_string()
                    } else {
                        format!("{int_part}.{frac_part}")
                    }
                } else {
                    let zeros: String = std::iter::repeat_n('0', (-point) as usize).collect();
                    format!("0.{zeros}{mant_str}")
                }
            };
            format!("{sign}{body}")
        } else {
            let (first, rest) = mant_str.split_at(1);
            if rest.is_empty() {
                format!("{sign}{first}e{adj}")
            } else {
                format!("{sign}{first}.{rest}e{adj}")
            }
        }
    }

    /// Absolute mantissa digits and the exponent, for rendering.
    fn mantissa_abs_string(&self) -> (String, i64) {
        let (mant, exp) = self.clone().into_parts();
        (mant.magnitude().to_str_radix(10), exp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Dec {
        Dec::parse(s).unwrap()
    }

    #[test]
    fn plain_rendering() {
        assert_eq!(dec("42").to_sig_string(50), "42");
        assert_eq!(dec("-0.001").to_sig_string(50), "-0.001");
        assert_eq!(dec("120").to_sig_string(50), "120");
        assert_eq!(dec("3.5").to_sig_string(50), "3.5");
        assert_eq!(dec("0").to_sig_string(50), "0");
    }

    #[test]
    fn scientific_rendering_for_extreme_magnitudes() {
        assert_eq!(dec("1e-80").to_sig_string(50), "1e-80");
        assert_eq!(dec("-2.5e90").to_sig_string(50), "-2.5e90");
        assert_eq!(dec("0.0000001").to_sig_string(50), "1e-7");
    }

    #[test]
    fn rounds_to_requested_digits() {
        assert_eq!(dec("1.23456789").to_sig_string(4), "1.235");
        assert_eq!(dec("1.25").to_sig_string(2), "1.2"); // half-even
    }

    #[test]
    fn formatting_is_idempotent() {
        let value = dec("1").checked_div(&dec("7")).unwrap();
        let a = sig_string(&value);
        let b = sig_string(&value);
        assert_eq!(a, b);
    }
}
