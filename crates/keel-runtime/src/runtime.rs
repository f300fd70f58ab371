//! Runtime - one composition root for container, bus, store, and
//! modules.
//!
//! ```text
//! RuntimeBuilder
//!     .register(..services..)
//!     .with_store("store", initial, options)
//!     .with_module(host)
//!     .build()
//!         │
//!         ▼ boot()
//! validate wiring ─▶ container.boot() ─▶ modules, in order
//!         │
//!         ▼ shutdown()
//! modules, reverse order ─▶ container.shutdown()
//! ```
//!
//! The runtime owns explicit instances; nothing here is global, so
//! tests and embedders can run as many runtimes side by side as they
//! like.

use crate::RuntimeError;
use keel_bus::EventBus;
use keel_container::{Registration, ServiceContainer, ServiceInstance};
use keel_module::ModuleHost;
use keel_store::{StateStore, StoreOptions};
use serde_json::{json, Value};
use std::sync::Arc;

/// Fluent composition of a [`Runtime`].
pub struct RuntimeBuilder {
    container: ServiceContainer,
    bus: EventBus,
    modules: Vec<ModuleHost>,
}

impl RuntimeBuilder {
    /// Starts an empty composition.
    #[must_use]
    pub fn new() -> Self {
        Self {
            container: ServiceContainer::new(),
            bus: EventBus::new(),
            modules: Vec::new(),
        }
    }

    /// Registers a service.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, registration: Registration) -> Self {
        self.container.register(name, registration);
        self
    }

    /// Registers an eager [`StateStore`] service over an initial
    /// state. Modules reach it with `ctx.service::<StateStore>(name)`.
    #[must_use]
    pub fn with_store(self, name: &str, initial: Value, options: StoreOptions) -> Self {
        self.register(
            name,
            Registration::build(move |_| {
                Ok(ServiceInstance::new(StateStore::new(
                    initial.clone(),
                    options.clone(),
                )))
            })
            .eager(),
        )
    }

    /// Adds a top-level module, initialized during boot in add order.
    #[must_use]
    pub fn with_module(mut self, host: ModuleHost) -> Self {
        self.modules.push(host);
        self
    }

    /// Finishes composition.
    #[must_use]
    pub fn build(self) -> Runtime {
        Runtime {
            container: Arc::new(self.container),
            bus: self.bus,
            modules: self.modules,
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A composed application runtime.
pub struct Runtime {
    container: Arc<ServiceContainer>,
    bus: EventBus,
    modules: Vec<ModuleHost>,
}

impl Runtime {
    /// Boots the runtime.
    ///
    /// Validates the declared service wiring, boots the container
    /// (eager services and lifecycle hooks), then initializes each
    /// top-level module in add order. The first module failure aborts
    /// the boot; already-initialized modules stay up so the caller can
    /// [`shutdown`](Self::shutdown) cleanly. On success publishes
    /// `runtime:ready`.
    pub async fn boot(&mut self) -> Result<(), RuntimeError> {
        self.container.validate_dependencies()?;
        self.container.boot();
        for module in &mut self.modules {
            tracing::debug!(module = %module.name(), "booting module");
            module.initialize(&self.container, &self.bus).await?;
        }
        self.bus.publish("runtime:ready", json!({})).await;
        tracing::debug!(modules = self.modules.len(), "runtime ready");
        Ok(())
    }

    /// Shuts the runtime down: modules in reverse add order, then the
    /// container. Idempotent.
    pub async fn shutdown(&mut self) {
        for module in self.modules.iter_mut().rev() {
            module.destroy().await;
        }
        self.container.shutdown();
        tracing::debug!("runtime stopped");
    }

    /// The shared service container.
    #[must_use]
    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }

    /// The shared event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Borrows a top-level module by name.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleHost> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// Mutably borrows a top-level module by name.
    pub fn module_mut(&mut self, name: &str) -> Option<&mut ModuleHost> {
        self.modules.iter_mut().find(|m| m.name() == name)
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("modules", &self.modules.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_container::ContainerError;
    use keel_types::ErrorCode;

    #[tokio::test]
    async fn boot_rejects_invalid_wiring() {
        let mut runtime = RuntimeBuilder::new()
            .register(
                "svc",
                Registration::build(|_| Ok(ServiceInstance::new(0u8)))
                    .with_dependencies(&["ghost"]),
            )
            .build();

        let err = runtime.boot().await.unwrap_err();
        assert_eq!(err.code(), "RUNTIME_CONTAINER_FAILED");
    }

    #[tokio::test]
    async fn store_service_is_resolvable_after_boot() {
        let mut runtime = RuntimeBuilder::new()
            .with_store("store", json!({"n": 1}), StoreOptions::default())
            .build();
        runtime.boot().await.unwrap();

        let store = runtime.container().resolve::<StateStore>("store").unwrap();
        assert_eq!(store.state_at("n"), Some(json!(1)));
    }

    #[tokio::test]
    async fn ready_event_fires_on_boot() {
        let mut runtime = RuntimeBuilder::new().build();
        let bus = runtime.bus().clone();
        let waiter = tokio::spawn(async move {
            bus.wait_for("runtime:ready", std::time::Duration::from_secs(5))
                .await
        });
        tokio::task::yield_now().await;

        runtime.boot().await.unwrap();
        waiter.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut runtime = RuntimeBuilder::new()
            .register(
                "svc",
                Registration::build(|_| {
                    Err::<ServiceInstance, _>(ContainerError::BuildFailed {
                        service: "svc".into(),
                        reason: "unused".into(),
                    })
                }),
            )
            .build();
        runtime.boot().await.unwrap();
        runtime.shutdown().await;
        runtime.shutdown().await;
    }
}
