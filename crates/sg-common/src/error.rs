//! Error types for StatGuard.
//!
//! Structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Structured context (field name, check name, parameter) so callers can
//!   act on a failure without re-running with added logging
//!
//! Every error here is recoverable by the caller; none is process-fatal and
//! none is used for ordinary control flow. A guardian "warn" is a normal
//! successful path, not an error.

use crate::report::GuardianReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for StatGuard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed, missing, or ambiguous request fields.
    Validation,
    /// Mathematically undefined input or failed numeric routine.
    Numeric,
    /// Input for which the requested statistic is undefined.
    Degenerate,
    /// Assumption validation refused to run the test.
    Guardian,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Numeric => write!(f, "numeric"),
            ErrorCategory::Degenerate => write!(f, "degenerate"),
            ErrorCategory::Guardian => write!(f, "guardian"),
        }
    }
}

/// Unified error type for StatGuard.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Request field is missing, ambiguous, or failed to parse.
    #[error("invalid request field `{field}`: {reason}")]
    Validation { field: String, reason: String },

    /// Special function called with a mathematically undefined parameter.
    #[error("domain error in {function}: {parameter} = {value}")]
    Domain {
        function: String,
        parameter: String,
        value: String,
    },

    /// Bounded iterative routine exhausted its iteration budget.
    #[error("{routine} did not converge within {max_iterations} iterations")]
    Convergence {
        routine: String,
        max_iterations: usize,
    },

    /// The statistic is mathematically undefined for this input.
    #[error("degenerate input: {quantity} vanished ({detail})")]
    DegenerateInput { quantity: String, detail: String },

    /// Design matrix is rank-deficient.
    #[error("singular design matrix: {detail}")]
    SingularMatrix { detail: String },

    /// Mandatory assumptions failed for the requested test.
    #[error("test blocked by assumption guardian{}", .suggested_alternative.as_ref().map(|alt| format!(" (suggested alternative: {alt})")).unwrap_or_default())]
    GuardianBlocked {
        report: GuardianReport,
        suggested_alternative: Option<String>,
    },
}

impl Error {
    /// Stable error code, grouped by category:
    /// - 10x: validation
    /// - 20x: numeric (domain, convergence)
    /// - 22x: degenerate input / singular matrix
    /// - 30x: guardian
    pub fn code(&self) -> u32 {
        match self {
            Error::Validation { .. } => 100,
            Error::Domain { .. } => 200,
            Error::Convergence { .. } => 210,
            Error::DegenerateInput { .. } => 220,
            Error::SingularMatrix { .. } => 221,
            Error::GuardianBlocked { .. } => 300,
        }
    }

    /// Category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation { .. } => ErrorCategory::Validation,
            Error::Domain { .. } | Error::Convergence { .. } => ErrorCategory::Numeric,
            Error::DegenerateInput { .. } | Error::SingularMatrix { .. } => {
                ErrorCategory::Degenerate
            }
            Error::GuardianBlocked { .. } => ErrorCategory::Guardian,
        }
    }

    /// Whether the caller can recover by changing the request.
    ///
    /// Every StatGuard error is recoverable; this accessor exists so hosts
    /// can treat the taxonomy uniformly with their own fatal errors.
    pub fn is_recoverable(&self) -> bool {
        true
    }

    /// The guardian report attached to a blocking error, if any.
    pub fn guardian_report(&self) -> Option<&GuardianReport> {
        match self {
            Error::GuardianBlocked { report, .. } => Some(report),
            _ => None,
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is recoverable by adjusting the request.
    pub recoverable: bool,

    /// Additional structured context (field, check, parameter).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,

    /// The guardian report, when the error is a guardian block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guardian_report: Option<GuardianReport>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();
        let mut guardian_report = None;

        match err {
            Error::Validation { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::Domain {
                function,
                parameter,
                value,
            } => {
                context.insert("function".to_string(), serde_json::json!(function));
                context.insert("parameter".to_string(), serde_json::json!(parameter));
                context.insert("value".to_string(), serde_json::json!(value));
            }
            Error::Convergence {
                routine,
                max_iterations,
            } => {
                context.insert("routine".to_string(), serde_json::json!(routine));
                context.insert(
                    "max_iterations".to_string(),
                    serde_json::json!(max_iterations),
                );
            }
            Error::DegenerateInput { quantity, .. } => {
                context.insert("quantity".to_string(), serde_json::json!(quantity));
            }
            Error::SingularMatrix { .. } => {}
            Error::GuardianBlocked {
                report,
                suggested_alternative,
            } => {
                if let Some(alt) = suggested_alternative {
                    context.insert("suggested_alternative".to_string(), serde_json::json!(alt));
                }
                guardian_report = Some(report.clone());
            }
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
            guardian_report,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = Error::Validation {
            field: "sample_a".into(),
            reason: "missing".into(),
        };
        assert_eq!(err.code(), 100);
        assert_eq!(err.category(), ErrorCategory::Validation);

        let err = Error::Convergence {
            routine: "beta_cdf".into(),
            max_iterations: 500,
        };
        assert_eq!(err.code(), 210);
        assert_eq!(err.category(), ErrorCategory::Numeric);
    }

    #[test]
    fn structured_error_carries_field_context() {
        let err = Error::Validation {
            field: "hypothesized_mean".into(),
            reason: "missing after alias resolution".into(),
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 100);
        assert_eq!(
            structured.context.get("field"),
            Some(&serde_json::json!("hypothesized_mean"))
        );
        assert!(structured.recoverable);
    }

    #[test]
    fn domain_error_names_the_parameter() {
        let err = Error::Domain {
            function: "student_t_cdf".into(),
            parameter: "df".into(),
            value: "-1".into(),
        };
        assert!(err.to_string().contains("df"));
        assert!(err.to_string().contains("-1"));
    }
}
