//! Descriptive statistics over [`Dec`] samples.
//!
//! Variance is the unbiased n-1 form. Degenerate samples (empty, or too
//! small for the requested quantity) are reported as `DegenerateInput`
//! rather than silently producing zero.

use crate::dec::{safe_div, Dec};
use sg_common::{Error, Result};

fn require_nonempty(data: &[Dec], quantity: &str) -> Result<()> {
    if data.is_empty() {
        return Err(Error::DegenerateInput {
            quantity: quantity.into(),
            detail: "sample is empty".into(),
        });
    }
    Ok(())
}

/// Exact sum.
pub fn sum(data: &[Dec]) -> Dec {
    data.iter().fold(Dec::zero(), |acc, v| &acc + v)
}

/// Arithmetic mean.
pub fn mean(data: &[Dec]) -> Result<Dec> {
    require_nonempty(data, "mean")?;
    safe_div(&sum(data), &Dec::from_usize(data.len()), "sample size")
}

/// Unbiased sample variance (n-1 denominator). Requires n >= 2.
pub fn variance(data: &[Dec]) -> Result<Dec> {
    if data.len() < 2 {
        return Err(Error::DegenerateInput {
            quantity: "variance".into(),
            detail: format!("need at least 2 observations, got {}", data.len()),
        });
    }
    let m = mean(data)?;
    let mut ss = Dec::zero();
    for v in data {
        let d = v - &m;
        ss = &ss + &(&d * &d);
    }
    safe_div(&ss, &Dec::from_usize(data.len() - 1), "n - 1")
}

/// Sample standard deviation.
pub fn std_dev(data: &[Dec]) -> Result<Dec> {
    variance(data)?.sqrt()
}

/// Median via sorted midpoint (average of the two central values for even n).
pub fn median(data: &[Dec]) -> Result<Dec> {
    require_nonempty(data, "median")?;
    let mut sorted = data.to_vec();
    sorted.sort();
    let n = sorted.len();
    if n % 2 == 1 {
        Ok(sorted[n / 2].clone())
    } else {
        Ok((&sorted[n / 2 - 1] + &sorted[n / 2]).halve())
    }
}

/// Median absolute deviation (unscaled).
pub fn mad(data: &[Dec]) -> Result<Dec> {
    let med = median(data)?;
    let deviations: Vec<Dec> = data.iter().map(|v| (v - &med).abs()).collect();
    median(&deviations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(vals: &[&str]) -> Vec<Dec> {
        vals.iter().map(|s| Dec::parse(s).unwrap()).collect()
    }

    #[test]
    fn mean_and_variance_exact() {
        let data = sample(&["2", "4", "4", "4", "5", "5", "7", "9"]);
        assert_eq!(mean(&data).unwrap(), Dec::parse("5").unwrap());
        // Sum of squared deviations is 32, n-1 = 7; 32/7 rounded to 20
        // significant digits.
        let v = variance(&data).unwrap();
        assert_eq!(v.to_sig_string(20), "4.5714285714285714286");
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(
            median(&sample(&["3", "1", "2"])).unwrap(),
            Dec::parse("2").unwrap()
        );
        assert_eq!(
            median(&sample(&["4", "1", "2", "3"])).unwrap(),
            Dec::parse("2.5").unwrap()
        );
    }

    #[test]
    fn mad_of_shifted_data() {
        let data = sample(&["1", "1", "2", "2", "4", "6", "9"]);
        // median = 2, |x - 2| = [1,1,0,0,2,4,7], median of that = 1.
        assert_eq!(mad(&data).unwrap(), Dec::parse("1").unwrap());
    }

    #[test]
    fn degenerate_samples_are_errors() {
        assert!(mean(&[]).is_err());
        assert!(variance(&sample(&["7"])).is_err());
        assert!(median(&[]).is_err());
    }

    #[test]
    fn constant_sample_has_zero_variance() {
        let data = sample(&["3", "3", "3"]);
        assert!(variance(&data).unwrap().is_zero());
    }
}
