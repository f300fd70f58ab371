//! Identifier types for the keel runtime.
//!
//! All identifiers are UUID-based so they stay unique across isolated
//! runtime instances (one container/bus pair per test, for example).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a bus or store subscription.
///
/// Returned by `subscribe` calls and used to unsubscribe later.
/// Unsubscribing an unknown or already-removed id is a no-op, which is
/// what makes unsubscribe functions idempotent.
///
/// # Example
///
/// ```
/// use keel_types::SubscriptionId;
///
/// let a = SubscriptionId::new();
/// let b = SubscriptionId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - ids are handed out by subscribe()
impl SubscriptionId {
    /// Creates a new [`SubscriptionId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// Identifier for a dispatched store action.
///
/// Each `dispatch()` call mints a fresh id; the id travels with the
/// action through middleware, the reducer, and the action log, so a
/// single dispatch can be correlated across all of them.
///
/// # Example
///
/// ```
/// use keel_types::ActionId;
///
/// let id = ActionId::new();
/// assert!(id.to_string().starts_with("act:"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

#[allow(clippy::new_without_default)] // Default intentionally not implemented - ids are minted by dispatch()
impl ActionId {
    /// Creates a new [`ActionId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "act:{}", self.0)
    }
}
