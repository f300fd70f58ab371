//! Service registrations - providers plus wiring metadata.

use crate::{ContainerError, ServiceContainer, ServiceInstance};
use std::sync::Arc;

/// Provider constructing a service from its resolved dependencies.
///
/// The slice holds the instances of
/// [`dependencies`](Registration::with_dependencies), in declaration
/// order.
pub type BuildFn =
    Arc<dyn Fn(&[ServiceInstance]) -> Result<ServiceInstance, ContainerError> + Send + Sync>;

/// Provider with full container access.
///
/// Used when construction needs conditional or named lookups that a
/// fixed dependency list cannot express. Resolutions made inside a
/// factory start a fresh cycle-detection chain.
pub type FactoryFn =
    Arc<dyn Fn(&ServiceContainer) -> Result<ServiceInstance, ContainerError> + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Provider {
    Build(BuildFn),
    Factory(FactoryFn),
}

/// A service registration: how to construct it, what it needs, and how
/// it is cached.
///
/// Built fluently and handed to
/// [`ServiceContainer::register`](crate::ServiceContainer::register):
///
/// ```
/// use keel_container::{Registration, ServiceContainer, ServiceInstance};
///
/// let mut container = ServiceContainer::new();
/// container.register("config", Registration::instance(42u32));
/// container.register(
///     "answer",
///     Registration::build(|deps| {
///         let config = deps[0].downcast::<u32>().unwrap();
///         Ok(ServiceInstance::new(format!("answer is {config}")))
///     })
///     .with_dependencies(&["config"]),
/// );
///
/// let answer = container.resolve::<String>("answer").unwrap();
/// assert_eq!(*answer, "answer is 42");
/// ```
///
/// Defaults: singleton, lazy, no aliases.
#[derive(Clone)]
pub struct Registration {
    pub(crate) provider: Provider,
    pub(crate) dependencies: Vec<String>,
    pub(crate) singleton: bool,
    pub(crate) eager: bool,
    pub(crate) aliases: Vec<String>,
}

impl Registration {
    /// Registration built from a dependency list.
    pub fn build<F>(provider: F) -> Self
    where
        F: Fn(&[ServiceInstance]) -> Result<ServiceInstance, ContainerError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            provider: Provider::Build(Arc::new(provider)),
            dependencies: Vec::new(),
            singleton: true,
            eager: false,
            aliases: Vec::new(),
        }
    }

    /// Registration built by a factory with container access.
    pub fn factory<F>(provider: F) -> Self
    where
        F: Fn(&ServiceContainer) -> Result<ServiceInstance, ContainerError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            provider: Provider::Factory(Arc::new(provider)),
            dependencies: Vec::new(),
            singleton: true,
            eager: false,
            aliases: Vec::new(),
        }
    }

    /// Registration for an already-constructed value.
    pub fn instance<T: Send + Sync + 'static>(value: T) -> Self {
        let instance = ServiceInstance::new(value);
        Self::build(move |_| Ok(instance.clone()))
    }

    /// Declares the services this one needs, in provider-slice order.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| (*d).to_string()).collect();
        self
    }

    /// Makes every resolve construct a fresh instance instead of
    /// caching the first one.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.singleton = false;
        self
    }

    /// Constructs the service during container boot instead of on
    /// first resolve.
    #[must_use]
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// Adds an alternate name resolving to this service.
    #[must_use]
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("dependencies", &self.dependencies)
            .field("singleton", &self.singleton)
            .field("eager", &self.eager)
            .field("aliases", &self.aliases)
            .finish()
    }
}
