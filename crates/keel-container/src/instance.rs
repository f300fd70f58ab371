//! Type-erased service instances and their lifecycle hooks.

use crate::ContainerError;
use std::any::Any;
use std::sync::Arc;

/// Optional lifecycle hooks for a registered service.
///
/// Services that hold resources (connections, watchers, caches)
/// implement this so the container can start them during
/// [`boot`](crate::ServiceContainer::boot) and release them during
/// [`shutdown`](crate::ServiceContainer::shutdown). Both hooks default
/// to no-ops; plain value services never implement the trait at all.
pub trait Lifecycle: Send + Sync {
    /// Called once for each booted singleton, in registration order.
    ///
    /// A failure is logged by the container and does not abort the
    /// boot of other services.
    fn boot(&self) -> Result<(), ContainerError> {
        Ok(())
    }

    /// Called during container shutdown, in reverse registration
    /// order. Must not fail; cleanup is best-effort.
    fn shutdown(&self) {}
}

/// A constructed service held by the container.
///
/// The value is type-erased so that heterogeneous services share one
/// cache; [`ServiceContainer::resolve`](crate::ServiceContainer::resolve)
/// recovers the concrete type with a checked downcast. Cloning is
/// cheap and yields a handle to the *same* underlying service, which
/// is what gives singletons their identity guarantee.
#[derive(Clone)]
pub struct ServiceInstance {
    value: Arc<dyn Any + Send + Sync>,
    lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl ServiceInstance {
    /// Wraps a plain value with no lifecycle hooks.
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            lifecycle: None,
        }
    }

    /// Wraps an already-shared value with no lifecycle hooks.
    #[must_use]
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value,
            lifecycle: None,
        }
    }

    /// Wraps a value that participates in container boot/shutdown.
    #[must_use]
    pub fn with_lifecycle<T>(value: Arc<T>) -> Self
    where
        T: Lifecycle + 'static,
    {
        Self {
            value: Arc::clone(&value) as Arc<dyn Any + Send + Sync>,
            lifecycle: Some(value),
        }
    }

    /// Attempts to view the instance as a `T`.
    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    pub(crate) fn lifecycle(&self) -> Option<&Arc<dyn Lifecycle>> {
        self.lifecycle.as_ref()
    }
}

impl std::fmt::Debug for ServiceInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceInstance")
            .field("has_lifecycle", &self.lifecycle.is_some())
            .finish()
    }
}
