//! Module lifecycle errors.
//!
//! # Error Code Convention
//!
//! All module errors use the `MODULE_` prefix:
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`ModuleError::AlreadyInitialized`] | `MODULE_ALREADY_INITIALIZED` | No |
//! | [`ModuleError::DependencyMissing`] | `MODULE_DEPENDENCY_MISSING` | No |
//! | [`ModuleError::InitFailed`] | `MODULE_INIT_FAILED` | Yes |
//! | [`ModuleError::NotInitialized`] | `MODULE_NOT_INITIALIZED` | No |
//! | [`ModuleError::ChildExists`] | `MODULE_CHILD_EXISTS` | No |
//! | [`ModuleError::Service`] | `MODULE_SERVICE_FAILED` | Delegates |
//!
//! Every initialization failure leaves the module back in
//! `uninitialized` with its tracked subscriptions released, so
//! `InitFailed` is safe to retry once the underlying cause is fixed.

use crate::LifecycleState;
use keel_container::ContainerError;
use keel_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Module lifecycle error.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum ModuleError {
    /// `initialize` was called on a module that already left the
    /// `uninitialized` state.
    #[error("module '{module}' cannot be initialized from state '{state}'")]
    AlreadyInitialized {
        /// The module.
        module: String,
        /// Its current state.
        state: LifecycleState,
    },

    /// A declared service dependency is not registered in the
    /// container. Checked before `on_initialize` runs.
    #[error("module '{module}' requires unregistered service '{dependency}'")]
    DependencyMissing {
        /// The module.
        module: String,
        /// The missing service name.
        dependency: String,
    },

    /// `on_initialize` (of the module itself or of a child) failed.
    ///
    /// **Recoverable** - the module reverted to `uninitialized` and
    /// may be initialized again.
    #[error("module '{module}' failed to initialize: {reason}")]
    InitFailed {
        /// The module.
        module: String,
        /// The underlying failure.
        reason: String,
    },

    /// An operation needing an initialized module (service lookup,
    /// tracked subscription) was called too early or after destroy.
    #[error("module '{module}' is not initialized")]
    NotInitialized {
        /// The module.
        module: String,
    },

    /// `add_child` would shadow an existing child of the same name.
    #[error("module '{module}' already has a child named '{child}'")]
    ChildExists {
        /// The parent module.
        module: String,
        /// The duplicate child name.
        child: String,
    },

    /// A service lookup through the module's container failed.
    #[error("service lookup failed: {0}")]
    Service(#[from] ContainerError),
}

impl ErrorCode for ModuleError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized { .. } => "MODULE_ALREADY_INITIALIZED",
            Self::DependencyMissing { .. } => "MODULE_DEPENDENCY_MISSING",
            Self::InitFailed { .. } => "MODULE_INIT_FAILED",
            Self::NotInitialized { .. } => "MODULE_NOT_INITIALIZED",
            Self::ChildExists { .. } => "MODULE_CHILD_EXISTS",
            Self::Service(_) => "MODULE_SERVICE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::InitFailed { .. } => true,
            Self::Service(inner) => inner.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_types::assert_error_codes;

    fn all_variants() -> Vec<ModuleError> {
        vec![
            ModuleError::AlreadyInitialized {
                module: "m".into(),
                state: LifecycleState::Initialized,
            },
            ModuleError::DependencyMissing {
                module: "m".into(),
                dependency: "d".into(),
            },
            ModuleError::InitFailed {
                module: "m".into(),
                reason: "r".into(),
            },
            ModuleError::NotInitialized { module: "m".into() },
            ModuleError::ChildExists {
                module: "m".into(),
                child: "c".into(),
            },
            ModuleError::Service(ContainerError::NotRegistered { name: "s".into() }),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "MODULE_");
    }

    #[test]
    fn service_recoverability_delegates_to_the_container() {
        let structural = ModuleError::Service(ContainerError::NotRegistered { name: "s".into() });
        assert!(!structural.is_recoverable());

        let transient = ModuleError::Service(ContainerError::BuildFailed {
            service: "s".into(),
            reason: "busy".into(),
        });
        assert!(transient.is_recoverable());
    }
}
