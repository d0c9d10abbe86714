//! Guardian report shapes.
//!
//! An [`AssumptionCheck`] is immutable once produced: the guardian builds the
//! full ordered list before the report is handed out, and nothing downstream
//! mutates it. Confidence scores are decimal strings produced by the result
//! formatter, so marginal violations can be distinguished from clear ones
//! without any float truncation.

use serde::{Deserialize, Serialize};

/// Final verdict of a single assumption check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Passed,
    Warned,
    Failed,
    NotApplicable,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::Warned => write!(f, "warned"),
            Verdict::Failed => write!(f, "failed"),
            Verdict::NotApplicable => write!(f, "not_applicable"),
        }
    }
}

/// One named assumption check with its verdict and rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionCheck {
    /// Check identifier, e.g. "normality" or "sample_size".
    pub name: String,

    /// Final verdict.
    pub verdict: Verdict,

    /// Confidence score as a decimal string (a p-value or scale-free score,
    /// depending on the check).
    pub confidence: String,

    /// Human-readable rationale for the verdict.
    pub rationale: String,
}

/// Overall recommendation of the guardian for one proposed test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "alternative")]
pub enum Recommendation {
    /// All applicable checks passed.
    Proceed,
    /// Advisory checks warned or failed; the statistic remains valid.
    ProceedWithCaution,
    /// A mandatory check failed; the test must not run. Carries the
    /// suggested alternative test identifier when one exists.
    UseAlternative(Option<String>),
}

/// Ordered collection of assumption checks plus the overall recommendation.
///
/// Owned by the call that produced it; this core never persists reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardianReport {
    /// Test the checks were evaluated against.
    pub test: String,

    /// Checks in evaluation order.
    pub checks: Vec<AssumptionCheck>,

    /// Overall recommendation.
    pub recommendation: Recommendation,
}

impl GuardianReport {
    /// Whether the report blocks test execution.
    pub fn is_blocking(&self) -> bool {
        matches!(self.recommendation, Recommendation::UseAlternative(_))
    }

    /// Look up a check by name.
    pub fn check(&self, name: &str) -> Option<&AssumptionCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

/// Guardian outcome attached to every canonical result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "report")]
pub enum GuardianOutcome {
    /// The guardian ran; the attached report gated this result.
    Report(GuardianReport),
    /// The guardian is not applicable to this request (e.g. power analysis,
    /// which consumes no dataset).
    Skipped,
}
