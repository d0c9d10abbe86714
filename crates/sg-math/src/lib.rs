//! Arbitrary-precision numeric core for statguard.
//!
//! Everything here computes over [`dec::Dec`], a decimal backed by a big
//! integer mantissa, at a precision configured through [`ctx`]. The layers
//! build upward: elementary functions, special functions, distribution
//! CDFs and quantiles, then the small linear algebra and descriptive
//! statistics kernels the test engine sits on.

pub mod combinatorics;
pub mod ctx;
pub mod dec;
pub mod dist;
pub mod format;
pub mod functions;
pub mod linalg;
pub mod special;
pub mod stats;

pub use ctx::{current_precision, with_precision, ScopedPrecision, DEFAULT_PRECISION, MAX_PRECISION};
pub use dec::{safe_div, Dec};
pub use format::sig_string;
