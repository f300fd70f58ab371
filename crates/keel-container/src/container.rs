//! ServiceContainer - registration, resolution, and lifecycle.
//!
//! ```text
//! register("db", Registration::build(..).with_dependencies(&["config"]))
//!     │
//!     ▼
//! resolve::<Db>("db")
//!     │  cache hit? ── yes ──▶ clone of the singleton
//!     │  no
//!     ▼
//! cycle check (resolution stack) ──▶ CONTAINER_CIRCULAR_DEPENDENCY
//!     │
//!     ▼
//! resolve dependencies, run provider, cache if singleton
//! ```
//!
//! # Caching
//!
//! Singletons (the default) are constructed once; every later resolve
//! returns a handle to the same instance. Transient registrations run
//! their provider on every resolve and are never cached. Provider
//! failures are not cached either, so a transiently failing service
//! can be retried.
//!
//! # Cycle Detection
//!
//! Each top-level resolve carries a stack of in-flight service names.
//! Re-entering a name on that stack fails with the full chain before
//! any provider in the cycle runs, so cycles have zero side effects.

use crate::registration::Provider;
use crate::{ContainerError, Registration, ServiceInstance};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Dependency-injection container.
///
/// Registration happens through `&mut self` while the application is
/// being composed; resolution and lifecycle only need `&self`, so the
/// finished container is typically shared as an `Arc<ServiceContainer>`.
pub struct ServiceContainer {
    descriptors: HashMap<String, Registration>,
    /// alias -> canonical name
    aliases: HashMap<String, String>,
    /// Canonical names in registration order; drives eager boot and
    /// reverse-order shutdown.
    order: Vec<String>,
    cache: Mutex<HashMap<String, ServiceInstance>>,
    booted: AtomicBool,
}

impl ServiceContainer {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            aliases: HashMap::new(),
            order: Vec::new(),
            cache: Mutex::new(HashMap::new()),
            booted: AtomicBool::new(false),
        }
    }

    /// Registers a service under a canonical name.
    ///
    /// Re-registering an existing name replaces the registration,
    /// drops any cached instance, and keeps the original position in
    /// registration order. Aliases declared on the registration become
    /// resolvable immediately.
    pub fn register(&mut self, name: impl Into<String>, registration: Registration) {
        let name = name.into();
        for alias in &registration.aliases {
            self.aliases.insert(alias.clone(), name.clone());
        }
        if self.descriptors.insert(name.clone(), registration).is_none() {
            self.order.push(name.clone());
        } else {
            tracing::debug!(service = %name, "re-registered service; dropping cached instance");
            self.cache.lock().remove(&name);
        }
    }

    /// Returns whether a name or alias has a registration.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.descriptors.contains_key(self.canonical(name))
    }

    /// Resolves a service and downcasts it to `T`.
    ///
    /// Constructs the service (and its transitive dependencies) on
    /// first resolve; singletons come back as handles to one shared
    /// instance on every call.
    pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ContainerError> {
        let instance = self.resolve_instance(name)?;
        instance
            .downcast::<T>()
            .ok_or_else(|| ContainerError::WrongType {
                service: self.canonical(name).to_string(),
            })
    }

    /// Resolves a service without downcasting.
    pub fn resolve_instance(&self, name: &str) -> Result<ServiceInstance, ContainerError> {
        let mut stack = Vec::new();
        self.resolve_inner(name, &mut stack)
    }

    fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map_or(name, String::as_str)
    }

    fn resolve_inner(
        &self,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<ServiceInstance, ContainerError> {
        let canonical = self.canonical(name);

        if let Some(cached) = self.cache.lock().get(canonical) {
            return Ok(cached.clone());
        }

        if stack.iter().any(|s| s == canonical) {
            let mut path = stack.clone();
            path.push(canonical.to_string());
            return Err(ContainerError::CircularDependency { path });
        }

        let registration =
            self.descriptors
                .get(canonical)
                .ok_or_else(|| ContainerError::NotRegistered {
                    name: canonical.to_string(),
                })?;

        stack.push(canonical.to_string());
        let built = self.run_provider(registration, stack);
        stack.pop();
        let instance = built?;

        if registration.singleton {
            self.cache
                .lock()
                .insert(canonical.to_string(), instance.clone());
        }
        Ok(instance)
    }

    fn run_provider(
        &self,
        registration: &Registration,
        stack: &mut Vec<String>,
    ) -> Result<ServiceInstance, ContainerError> {
        match &registration.provider {
            Provider::Build(build) => {
                let mut resolved = Vec::with_capacity(registration.dependencies.len());
                for dependency in &registration.dependencies {
                    resolved.push(self.resolve_inner(dependency, stack)?);
                }
                build(&resolved)
            }
            // Factory lookups start a fresh resolution chain; a factory
            // that re-enters its own service will still loop through the
            // cache miss and is the factory author's bug to avoid.
            Provider::Factory(factory) => factory(self),
        }
    }

    /// Boots the container.
    ///
    /// Constructs every eager registration in registration order, then
    /// runs the [`Lifecycle::boot`](crate::Lifecycle::boot) hook of
    /// each cached singleton, also in registration order. Failures are
    /// logged and isolated so one bad service cannot block the rest.
    /// Idempotent: later calls are no-ops.
    pub fn boot(&self) {
        if self.booted.swap(true, Ordering::SeqCst) {
            tracing::debug!("container already booted; ignoring");
            return;
        }

        for name in &self.order {
            let eager = self.descriptors.get(name).is_some_and(|r| r.eager);
            if eager {
                if let Err(error) = self.resolve_instance(name) {
                    tracing::warn!(service = %name, %error, "eager service failed to build during boot");
                }
            }
        }

        for name in &self.order {
            let cached = self.cache.lock().get(name).cloned();
            let Some(instance) = cached else { continue };
            if let Some(lifecycle) = instance.lifecycle() {
                if let Err(error) = lifecycle.boot() {
                    tracing::warn!(service = %name, %error, "service boot hook failed");
                }
            }
        }
    }

    /// Shuts the container down.
    ///
    /// Runs [`Lifecycle::shutdown`](crate::Lifecycle::shutdown) hooks
    /// of cached singletons in reverse registration order, once per
    /// boot. The registry and the singleton cache are retained: a
    /// service resolved after shutdown is still the one constructed
    /// before it, never a second instance.
    pub fn shutdown(&self) {
        if !self.booted.swap(false, Ordering::SeqCst) {
            tracing::debug!("container not booted; skipping shutdown hooks");
            return;
        }
        for name in self.order.iter().rev() {
            let cached = self.cache.lock().get(name).cloned();
            let Some(instance) = cached else { continue };
            if let Some(lifecycle) = instance.lifecycle() {
                tracing::debug!(service = %name, "shutting down service");
                lifecycle.shutdown();
            }
        }
    }

    /// Creates a child scope.
    ///
    /// The scope inherits every registration and alias but starts with
    /// an empty cache, so its singletons are constructed independently
    /// of the parent's. Overrides replace (or add) registrations in
    /// the scope only; the parent is untouched.
    #[must_use]
    pub fn create_scope(&self, overrides: Vec<(String, Registration)>) -> ServiceContainer {
        let mut scope = ServiceContainer {
            descriptors: self.descriptors.clone(),
            aliases: self.aliases.clone(),
            order: self.order.clone(),
            cache: Mutex::new(HashMap::new()),
            booted: AtomicBool::new(false),
        };
        for (name, registration) in overrides {
            scope.register(name, registration);
        }
        scope
    }

    /// Returns the declared dependency edges, keyed by service name.
    #[must_use]
    pub fn dependency_graph(&self) -> BTreeMap<String, Vec<String>> {
        self.descriptors
            .iter()
            .map(|(name, registration)| (name.clone(), registration.dependencies.clone()))
            .collect()
    }

    /// Validates the declared wiring without constructing anything.
    ///
    /// Reports the first missing dependency or declared cycle found.
    /// Factories that resolve undeclared services are outside this
    /// check; it covers the declarative graph only.
    pub fn validate_dependencies(&self) -> Result<(), ContainerError> {
        for name in &self.order {
            let Some(registration) = self.descriptors.get(name) else {
                continue;
            };
            for dependency in &registration.dependencies {
                if !self.has(dependency) {
                    return Err(ContainerError::MissingDependency {
                        service: name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        let mut visited = Vec::new();
        for name in &self.order {
            let mut chain = Vec::new();
            self.check_cycles(name, &mut chain, &mut visited)?;
        }
        Ok(())
    }

    fn check_cycles(
        &self,
        name: &str,
        chain: &mut Vec<String>,
        visited: &mut Vec<String>,
    ) -> Result<(), ContainerError> {
        let canonical = self.canonical(name);
        if visited.iter().any(|v| v == canonical) {
            return Ok(());
        }
        if chain.iter().any(|c| c == canonical) {
            let mut path = chain.clone();
            path.push(canonical.to_string());
            return Err(ContainerError::CircularDependency { path });
        }
        let Some(registration) = self.descriptors.get(canonical) else {
            return Ok(());
        };
        chain.push(canonical.to_string());
        for dependency in &registration.dependencies {
            self.check_cycles(dependency, chain, visited)?;
        }
        chain.pop();
        visited.push(canonical.to_string());
        Ok(())
    }

    /// Returns the registered canonical names in registration order.
    #[must_use]
    pub fn service_names(&self) -> Vec<String> {
        self.order.clone()
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.order)
            .field("booted", &self.booted.load(Ordering::SeqCst))
            .finish()
    }
}
