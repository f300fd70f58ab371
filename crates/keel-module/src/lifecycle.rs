//! Module lifecycle states.
//!
//! ```text
//! uninitialized ──▶ initializing ──▶ initialized ──▶ destroyed
//!        ▲                │
//!        └── revert on ───┘
//!            failure
//! ```
//!
//! `destroyed` is terminal; a destroyed module is never re-initialized.
//! Any failure during initialization reverts to `uninitialized`, so a
//! fixed precondition allows a clean retry.

use serde::{Deserialize, Serialize};

/// Where a module is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Constructed, not yet initialized. Initialization may be
    /// attempted (again).
    Uninitialized,
    /// `on_initialize` is in flight.
    Initializing,
    /// Fully operational.
    Initialized,
    /// Torn down. Terminal.
    Destroyed,
}

impl LifecycleState {
    /// Whether the module is operational.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Initialized)
    }

    /// Whether the module can never become active again.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Destroyed => "destroyed",
        };
        write!(f, "{s}")
    }
}
