//! Event bus errors.
//!
//! # Error Code Convention
//!
//! All bus errors use the `BUS_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`BusError::Timeout`] | `BUS_TIMEOUT` | Yes |
//! | [`BusError::WaitCancelled`] | `BUS_WAIT_CANCELLED` | Yes |
//! | [`BusError::HandlerFailed`] | `BUS_HANDLER_FAILED` | Yes |
//! | [`BusError::MiddlewareFailed`] | `BUS_MIDDLEWARE_FAILED` | Yes |
//!
//! # Propagation Policy
//!
//! Run-time event fan-out is best-effort: a handler or middleware
//! failure is logged and isolated, never surfaced to the publisher.
//! The only bus errors a caller ever sees are the `wait_for` outcomes
//! ([`Timeout`](BusError::Timeout), [`WaitCancelled`](BusError::WaitCancelled)),
//! and those reject only the waiting caller.

use keel_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Event bus error.
///
/// `HandlerFailed` and `MiddlewareFailed` exist so that handlers and
/// middleware have a typed failure channel; the bus itself only logs
/// them. `Timeout` and `WaitCancelled` are returned from
/// [`wait_for`](crate::EventBus::wait_for).
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum BusError {
    /// No publish arrived for the awaited event within the deadline.
    ///
    /// **Recoverable** - the event may still be published later.
    #[error("timed out waiting for event '{event}'")]
    Timeout {
        /// The event that was being waited on.
        event: String,
    },

    /// The waiting subscription was torn down before the event fired,
    /// e.g. by `clear()`.
    ///
    /// **Recoverable** - a fresh `wait_for` can be issued.
    #[error("wait for event '{event}' was cancelled")]
    WaitCancelled {
        /// The event that was being waited on.
        event: String,
    },

    /// A subscriber's handler reported a failure.
    ///
    /// Isolated per handler: logged by the bus, never propagated to
    /// the publisher or to sibling handlers.
    #[error("handler failed: {0}")]
    HandlerFailed(String),

    /// A middleware reported a failure.
    ///
    /// Isolated per middleware: the pipeline continues with the last
    /// good payload.
    #[error("middleware failed: {0}")]
    MiddlewareFailed(String),
}

impl ErrorCode for BusError {
    fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "BUS_TIMEOUT",
            Self::WaitCancelled { .. } => "BUS_WAIT_CANCELLED",
            Self::HandlerFailed(_) => "BUS_HANDLER_FAILED",
            Self::MiddlewareFailed(_) => "BUS_MIDDLEWARE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // Fan-out errors are transient by definition: the next publish
        // starts from a clean slate.
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_types::assert_error_codes;

    fn all_variants() -> Vec<BusError> {
        vec![
            BusError::Timeout { event: "x".into() },
            BusError::WaitCancelled { event: "x".into() },
            BusError::HandlerFailed("x".into()),
            BusError::MiddlewareFailed("x".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "BUS_");
    }

    #[test]
    fn timeout_mentions_event() {
        let err = BusError::Timeout {
            event: "save:done".into(),
        };
        assert_eq!(err.code(), "BUS_TIMEOUT");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("save:done"));
    }
}
