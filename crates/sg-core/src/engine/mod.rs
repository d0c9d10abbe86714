//! Test engine: dispatch and shared inference helpers.
//!
//! Each test implementation is a pure function of the canonical request and
//! the guardian outcome. The dispatch match is exhaustive over the request
//! enum, so a new family without an engine arm fails to compile.

mod anova;
mod categorical;
mod correlation;
mod nonparametric;
mod power;
mod regression;
mod ttest;

use std::collections::BTreeMap;

use sg_common::{CanonicalResult, Result};
use sg_math::{sig_string, Dec};

use crate::guardian;
use crate::model::{Alternative, CanonicalRequest};

/// Validate assumptions, then compute the requested statistic.
pub fn execute(request: &CanonicalRequest) -> Result<CanonicalResult> {
    let outcome = guardian::evaluate(request)?;
    tracing::debug!(test = request.test_id(), "dispatching test");
    match request {
        CanonicalRequest::TTest {
            kind,
            alpha,
            alternative,
        } => ttest::run(kind, alpha, *alternative, outcome),
        CanonicalRequest::Anova { groups, alpha } => anova::run(groups, alpha, outcome),
        CanonicalRequest::Regression {
            response,
            predictors,
            alpha,
        } => regression::run(response, predictors, alpha, outcome),
        CanonicalRequest::Correlation {
            method,
            x,
            y,
            alternative,
        } => correlation::run(*method, x, y, *alternative, outcome),
        CanonicalRequest::NonParametric { kind, alternative } => {
            nonparametric::run(kind, *alternative, outcome)
        }
        CanonicalRequest::Categorical { kind, alternative } => {
            categorical::run(kind, *alternative, outcome)
        }
        CanonicalRequest::PowerAnalysis {
            query,
            alpha,
            alternative,
        } => power::run(query, alpha, *alternative, outcome),
    }
}

/// P-value for a symmetric statistic given the CDF value at the statistic.
/// Two-sided doubles the smaller tail.
pub(crate) fn p_from_cdf(cdf: &Dec, alternative: Alternative) -> Dec {
    let upper = &Dec::one() - cdf;
    match alternative {
        Alternative::Less => cdf.clone(),
        Alternative::Greater => upper,
        Alternative::TwoSided => {
            let smaller = if *cdf < upper { cdf.clone() } else { upper };
            &Dec::from_int(2) * &smaller
        }
    }
}

/// Upper-tail p for chi-square and F statistics.
pub(crate) fn upper_tail(cdf: &Dec) -> Dec {
    &Dec::one() - cdf
}

/// Insert a formatted value into a result map.
pub(crate) fn put(map: &mut BTreeMap<String, String>, key: &str, value: &Dec) {
    map.insert(key.to_string(), sig_string(value));
}
