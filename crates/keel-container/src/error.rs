//! Service container errors.
//!
//! # Error Code Convention
//!
//! All container errors use the `CONTAINER_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`ContainerError::NotRegistered`] | `CONTAINER_NOT_REGISTERED` | No |
//! | [`ContainerError::CircularDependency`] | `CONTAINER_CIRCULAR_DEPENDENCY` | No |
//! | [`ContainerError::BuildFailed`] | `CONTAINER_BUILD_FAILED` | Yes |
//! | [`ContainerError::WrongType`] | `CONTAINER_WRONG_TYPE` | No |
//! | [`ContainerError::MissingDependency`] | `CONTAINER_MISSING_DEPENDENCY` | No |
//!
//! Wiring mistakes (unknown names, cycles, type mismatches) are
//! structural: retrying cannot fix them, only a code change can. Only
//! `BuildFailed` is recoverable, since a provider may fail on a
//! transient condition.

use keel_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Service container error.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ContainerError {
    /// The requested service name (or alias) has no registration.
    #[error("service '{name}' is not registered")]
    NotRegistered {
        /// The unknown service name.
        name: String,
    },

    /// Resolution re-entered a service already being constructed.
    ///
    /// The path lists the full chain, ending with the repeated
    /// service, e.g. `a -> b -> a`. Detected before any provider in
    /// the cycle runs, so no partially constructed service is ever
    /// cached.
    #[error("circular dependency detected: {}", path.join(" -> "))]
    CircularDependency {
        /// The resolution chain, ending with the repeated service.
        path: Vec<String>,
    },

    /// A provider returned an error while constructing its service.
    ///
    /// **Recoverable** - the provider may succeed on a later resolve
    /// (the failure is not cached).
    #[error("failed to build service '{service}': {reason}")]
    BuildFailed {
        /// The service whose provider failed.
        service: String,
        /// Provider-supplied failure description.
        reason: String,
    },

    /// The service exists but is not of the requested type.
    #[error("service '{service}' is not of the requested type")]
    WrongType {
        /// The service that was resolved.
        service: String,
    },

    /// A registration declares a dependency that is not registered.
    ///
    /// Reported by [`validate_dependencies`](crate::ServiceContainer::validate_dependencies)
    /// ahead of any resolution.
    #[error("service '{service}' depends on unregistered service '{dependency}'")]
    MissingDependency {
        /// The service with the bad declaration.
        service: String,
        /// The dependency that is missing.
        dependency: String,
    },
}

impl ErrorCode for ContainerError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotRegistered { .. } => "CONTAINER_NOT_REGISTERED",
            Self::CircularDependency { .. } => "CONTAINER_CIRCULAR_DEPENDENCY",
            Self::BuildFailed { .. } => "CONTAINER_BUILD_FAILED",
            Self::WrongType { .. } => "CONTAINER_WRONG_TYPE",
            Self::MissingDependency { .. } => "CONTAINER_MISSING_DEPENDENCY",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::BuildFailed { .. })
    }
}
