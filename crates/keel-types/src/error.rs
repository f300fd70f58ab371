//! Unified error code interface for keel crates.
//!
//! Every error enum in the runtime implements [`ErrorCode`] so that
//! callers can branch on stable machine-readable codes instead of
//! matching on display strings, and so that retry logic has a single
//! place to ask "is this worth retrying?".
//!
//! # Code Convention
//!
//! | Crate | Prefix |
//! |-------|--------|
//! | keel-container | `CONTAINER_` |
//! | keel-bus | `BUS_` |
//! | keel-module | `MODULE_` |
//! | keel-runtime | `RUNTIME_` |
//!
//! Codes are UPPER_SNAKE_CASE and stable once published.
//!
//! # Recoverability
//!
//! An error is **recoverable** when retrying may succeed (timeouts,
//! transient build failures). Wiring errors (unknown service names,
//! dependency cycles, lifecycle misuse) are structural and never
//! recoverable: retrying without a code change cannot fix them.
//!
//! # Example
//!
//! ```
//! use keel_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum WireError {
//!     Unknown(String),
//!     Busy,
//! }
//!
//! impl ErrorCode for WireError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Unknown(_) => "WIRE_UNKNOWN",
//!             Self::Busy => "WIRE_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! assert_eq!(WireError::Busy.code(), "WIRE_BUSY");
//! assert!(WireError::Busy.is_recoverable());
//! ```

/// Machine-readable error code interface.
///
/// Implemented by every error enum in the keel workspace.
pub trait ErrorCode {
    /// Returns a stable, machine-readable error code.
    ///
    /// UPPER_SNAKE_CASE, prefixed with the owning crate's domain
    /// (`CONTAINER_`, `BUS_`, `MODULE_`). Changing a published code is
    /// a breaking change.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the failed operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that a single error code follows keel conventions.
///
/// Checks that the code is non-empty, carries the expected prefix, and
/// is UPPER_SNAKE_CASE.
///
/// # Panics
///
/// Panics with a descriptive message if any check fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Asserts conventions for every variant of an error enum at once.
///
/// Each error module keeps an `all_variants()` helper in its tests and
/// feeds it through this function, so adding a variant without a code
/// fails the suite.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
