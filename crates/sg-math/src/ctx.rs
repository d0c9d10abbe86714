//! Process-wide decimal precision configuration.
//!
//! Every arithmetic operation in StatGuard runs at the precision configured
//! here, plus a fixed number of guard digits. The active precision is held in
//! a thread-local stack: [`with_precision`] pushes a new value and returns a
//! guard that pops it on drop, so the previous precision is restored on every
//! exit path and concurrent calls at different precisions cannot corrupt each
//! other. There is no process-global mutable toggle.

use sg_common::{Error, Result};
use std::cell::RefCell;

/// Default number of significant decimal digits.
pub const DEFAULT_PRECISION: u32 = 50;

/// Upper bound on requestable precision. Keeps iteration budgets and
/// mantissa sizes bounded.
pub const MAX_PRECISION: u32 = 4_096;

/// Guard digits carried by intermediate arithmetic so error below the
/// configured digit count cannot leak upward into reported results.
pub(crate) const GUARD_DIGITS: u32 = 10;

thread_local! {
    static PRECISION_STACK: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
}

/// The precision currently in effect on this thread.
pub fn current_precision() -> u32 {
    PRECISION_STACK.with(|stack| stack.borrow().last().copied().unwrap_or(DEFAULT_PRECISION))
}

/// Working digit count for intermediate arithmetic.
pub(crate) fn working_digits() -> u64 {
    u64::from(current_precision()) + u64::from(GUARD_DIGITS)
}

/// Scoped precision acquisition.
///
/// Restores the previously active precision when dropped, including on
/// panic unwind.
#[derive(Debug)]
pub struct ScopedPrecision {
    // Not Send: the guard must be dropped on the thread that created it.
    _not_send: std::marker::PhantomData<*const ()>,
}

/// Activate `digits` significant digits for the current scope.
///
/// ```
/// use sg_math::ctx::{current_precision, with_precision};
///
/// assert_eq!(current_precision(), 50);
/// {
///     let _scope = with_precision(80).unwrap();
///     assert_eq!(current_precision(), 80);
/// }
/// assert_eq!(current_precision(), 50);
/// ```
pub fn with_precision(digits: u32) -> Result<ScopedPrecision> {
    if digits == 0 || digits > MAX_PRECISION {
        return Err(Error::Validation {
            field: "precision".into(),
            reason: format!("must be in 1..={MAX_PRECISION}, got {digits}"),
        });
    }
    PRECISION_STACK.with(|stack| stack.borrow_mut().push(digits));
    Ok(ScopedPrecision {
        _not_send: std::marker::PhantomData,
    })
}

impl Drop for ScopedPrecision {
    fn drop(&mut self) {
        PRECISION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fifty_digits() {
        assert_eq!(current_precision(), DEFAULT_PRECISION);
    }

    #[test]
    fn nesting_restores_previous_precision() {
        let _outer = with_precision(30).unwrap();
        assert_eq!(current_precision(), 30);
        {
            let _inner = with_precision(100).unwrap();
            assert_eq!(current_precision(), 100);
        }
        assert_eq!(current_precision(), 30);
    }

    #[test]
    fn restored_on_panic_path() {
        let result = std::panic::catch_unwind(|| {
            let _scope = with_precision(77).unwrap();
            panic!("unwind through the guard");
        });
        assert!(result.is_err());
        assert_eq!(current_precision(), DEFAULT_PRECISION);
    }

    #[test]
    fn zero_and_oversized_precisions_rejected() {
        assert!(with_precision(0).is_err());
        assert!(with_precision(MAX_PRECISION + 1).is_err());
    }

    #[test]
    fn threads_do_not_share_precision() {
        let _outer = with_precision(200).unwrap();
        let other = std::thread::spawn(current_precision).join().unwrap();
        assert_eq!(other, DEFAULT_PRECISION);
    }
}
