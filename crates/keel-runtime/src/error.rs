//! Runtime errors.
//!
//! The runtime itself adds no failure modes of its own; it forwards
//! container wiring errors and module lifecycle errors under the
//! `RUNTIME_` prefix so callers can tell boot-time failures apart from
//! direct subsystem use.

use keel_container::ContainerError;
use keel_module::ModuleError;
use keel_types::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime boot/shutdown error.
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum RuntimeError {
    /// Container wiring failed validation during boot.
    #[error("container wiring invalid: {0}")]
    Container(#[from] ContainerError),

    /// A top-level module failed to initialize during boot.
    #[error("module boot failed: {0}")]
    Module(#[from] ModuleError),
}

impl ErrorCode for RuntimeError {
    fn code(&self) -> &'static str {
        match self {
            Self::Container(_) => "RUNTIME_CONTAINER_FAILED",
            Self::Module(_) => "RUNTIME_MODULE_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Container(inner) => inner.is_recoverable(),
            Self::Module(inner) => inner.is_recoverable(),
        }
    }
}
