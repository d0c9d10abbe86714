//! StatGuard shared types, errors, and report shapes.
//!
//! This crate provides the foundational types shared across the StatGuard
//! workspace:
//! - The unified error taxonomy with stable codes
//! - Guardian report shapes (assumption checks, verdicts, recommendations)
//! - The canonical result every test implementation produces

pub mod error;
pub mod report;
pub mod result;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use report::{
    AssumptionCheck, GuardianOutcome, GuardianReport, Recommendation, Verdict,
};
pub use result::CanonicalResult;
