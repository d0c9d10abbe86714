//! Canonical request shapes.
//!
//! Everything here is alias-free: the adapter is the only producer, and the
//! engine never sees raw caller field names. Each family variant holds
//! exactly the parameters that family needs.

use serde::{Deserialize, Serialize};
use sg_math::Dec;

/// An ordered sample of high-precision values.
pub type Dataset = Vec<Dec>;

/// Alternative hypothesis direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alternative {
    #[default]
    TwoSided,
    Less,
    Greater,
}

impl Alternative {
    /// Accepts the directional spellings hosts actually send.
    pub fn parse(raw: &str) -> Option<Alternative> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "two_sided" | "two-sided" | "two.sided" | "both" => Some(Alternative::TwoSided),
            "less" | "left" | "lower" => Some(Alternative::Less),
            "greater" | "right" | "upper" => Some(Alternative::Greater),
            _ => None,
        }
    }
}

/// T-test flavors. Two-sample defaults to Welch; pooled is opt-in.
#[derive(Debug, Clone, PartialEq)]
pub enum TTestKind {
    OneSample {
        sample: Dataset,
        hypothesized_mean: Dec,
    },
    Paired {
        sample_a: Dataset,
        sample_b: Dataset,
    },
    TwoSample {
        sample_a: Dataset,
        sample_b: Dataset,
        pooled: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NonParametricKind {
    MannWhitneyU { sample_a: Dataset, sample_b: Dataset },
    WilcoxonSignedRank { sample_a: Dataset, sample_b: Dataset },
    KruskalWallis { groups: Vec<Dataset> },
    /// Rows are blocks, columns are treatments.
    Friedman { blocks: Vec<Dataset> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CategoricalKind {
    ChiSquareIndependence {
        table: Vec<Vec<Dec>>,
    },
    ChiSquareGoodnessOfFit {
        observed: Dataset,
        /// Expected counts or probabilities; uniform when absent.
        expected: Option<Dataset>,
    },
    FisherExact {
        table: [[u64; 2]; 2],
    },
    BinomialTest {
        successes: u64,
        trials: u64,
        probability: Dec,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDesign {
    OneSample,
    TwoSample,
}

/// Power analysis solves whichever of `power` / `sample_size` is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerQuery {
    pub design: PowerDesign,
    pub effect_size: Dec,
    pub sample_size: Option<u64>,
    pub power: Option<Dec>,
}

/// The canonical request: one variant per test family. Dispatch over this
/// enum is exhaustive, so adding a family without an engine arm is a
/// compile error.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRequest {
    TTest {
        kind: TTestKind,
        alpha: Dec,
        alternative: Alternative,
    },
    Anova {
        groups: Vec<Dataset>,
        alpha: Dec,
    },
    Regression {
        response: Dataset,
        /// Design columns, intercept excluded (the engine prepends it).
        predictors: Vec<Dataset>,
        alpha: Dec,
    },
    Correlation {
        method: CorrelationMethod,
        x: Dataset,
        y: Dataset,
        alternative: Alternative,
    },
    NonParametric {
        kind: NonParametricKind,
        alternative: Alternative,
    },
    Categorical {
        kind: CategoricalKind,
        alternative: Alternative,
    },
    PowerAnalysis {
        query: PowerQuery,
        alpha: Dec,
        alternative: Alternative,
    },
}

impl CanonicalRequest {
    /// Stable test identifier, used as the `test` field of every result.
    pub fn test_id(&self) -> &'static str {
        match self {
            CanonicalRequest::TTest { kind, .. } => match kind {
                TTestKind::OneSample { .. } => "one_sample_t_test",
                TTestKind::Paired { .. } => "paired_t_test",
                TTestKind::TwoSample { pooled: true, .. } => "pooled_t_test",
                TTestKind::TwoSample { pooled: false, .. } => "welch_t_test",
            },
            CanonicalRequest::Anova { .. } => "one_way_anova",
            CanonicalRequest::Regression { .. } => "linear_regression",
            CanonicalRequest::Correlation { method, .. } => match method {
                CorrelationMethod::Pearson => "pearson_correlation",
                CorrelationMethod::Spearman => "spearman_correlation",
            },
            CanonicalRequest::NonParametric { kind, .. } => match kind {
                NonParametricKind::MannWhitneyU { .. } => "mann_whitney_u",
                NonParametricKind::WilcoxonSignedRank { .. } => "wilcoxon_signed_rank",
                NonParametricKind::KruskalWallis { .. } => "kruskal_wallis",
                NonParametricKind::Friedman { .. } => "friedman",
            },
            CanonicalRequest::Categorical { kind, .. } => match kind {
                CategoricalKind::ChiSquareIndependence { .. } => "chi_square_independence",
                CategoricalKind::ChiSquareGoodnessOfFit { .. } => "chi_square_goodness_of_fit",
                CategoricalKind::FisherExact { .. } => "fisher_exact",
                CategoricalKind::BinomialTest { .. } => "binomial_test",
            },
            CanonicalRequest::PowerAnalysis { .. } => "power_analysis",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternative_spellings() {
        assert_eq!(Alternative::parse("two-sided"), Some(Alternative::TwoSided));
        assert_eq!(Alternative::parse("LESS"), Some(Alternative::Less));
        assert_eq!(Alternative::parse("right"), Some(Alternative::Greater));
        assert_eq!(Alternative::parse("sideways"), None);
    }

    #[test]
    fn welch_is_the_default_two_sample_id() {
        let req = CanonicalRequest::TTest {
            kind: TTestKind::TwoSample {
                sample_a: vec![],
                sample_b: vec![],
                pooled: false,
            },
            alpha: Dec::parse("0.05").unwrap(),
            alternative: Alternative::TwoSided,
        };
        assert_eq!(req.test_id(), "welch_t_test");
    }
}
