//! The [`Module`] trait and its initialization context.

use crate::ModuleError;
use async_trait::async_trait;
use keel_bus::{BusError, EventBus, SubscribeOptions, SubscriptionHandle};
use keel_container::ServiceContainer;
use keel_types::{get_path, set_path};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Application building block with a managed lifecycle.
///
/// Implementors provide a name, optional service dependencies, and the
/// two lifecycle hooks; everything else (state tracking, dependency
/// checks, subscription cleanup, child ordering) is handled by
/// [`ModuleHost`](crate::ModuleHost).
///
/// ```
/// use async_trait::async_trait;
/// use keel_module::{Module, ModuleCtx, ModuleError};
/// use serde_json::json;
///
/// struct AuditModule;
///
/// #[async_trait]
/// impl Module for AuditModule {
///     fn name(&self) -> &str {
///         "audit"
///     }
///
///     fn dependencies(&self) -> &[&str] {
///         &["store"]
///     }
///
///     async fn on_initialize(&mut self, ctx: &mut ModuleCtx<'_>) -> Result<(), ModuleError> {
///         ctx.subscribe("doc:saved", |payload| async move {
///             tracing::debug!(?payload, "audit entry");
///             Ok(())
///         });
///         ctx.emit("audit:ready", json!({})).await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Module: Send {
    /// Unique module name; also used for parent/child links.
    fn name(&self) -> &str;

    /// Service names this module requires. Checked against the
    /// container before `on_initialize` runs.
    fn dependencies(&self) -> &[&str] {
        &[]
    }

    /// Initialization hook. Subscriptions made through the context are
    /// tracked and released automatically on failure or destroy.
    async fn on_initialize(&mut self, ctx: &mut ModuleCtx<'_>) -> Result<(), ModuleError> {
        let _ = ctx;
        Ok(())
    }

    /// Teardown hook. Runs before tracked subscriptions are released.
    async fn on_destroy(&mut self) {}
}

/// Capabilities handed to [`Module::on_initialize`].
///
/// Borrows the host's wiring for the duration of the hook; tracked
/// subscriptions and configuration writes land back on the host.
pub struct ModuleCtx<'a> {
    pub(crate) container: &'a Arc<ServiceContainer>,
    pub(crate) bus: &'a EventBus,
    pub(crate) subscriptions: &'a mut Vec<SubscriptionHandle>,
    pub(crate) config: &'a mut Value,
    pub(crate) module: String,
}

impl ModuleCtx<'_> {
    /// Resolves a service from the container.
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ModuleError> {
        Ok(self.container.resolve::<T>(name)?)
    }

    /// Subscribes to a bus event, tracked for automatic cleanup.
    pub fn subscribe<F, Fut>(&mut self, event: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        self.subscribe_with(event, handler, SubscribeOptions::default());
    }

    /// Tracked subscription with explicit options.
    pub fn subscribe_with<F, Fut>(
        &mut self,
        event: impl Into<String>,
        handler: F,
        options: SubscribeOptions,
    ) where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        let handle = self.bus.subscribe(event, handler, options);
        self.subscriptions.push(handle);
    }

    /// Publishes an event on the shared bus.
    pub async fn emit(&self, event: &str, payload: Value) -> usize {
        self.bus.publish(event, payload).await
    }

    /// Reads a dotted path from the module's configuration.
    #[must_use]
    pub fn get_config(&self, path: &str) -> Option<Value> {
        get_path(self.config, path).cloned()
    }

    /// Writes a dotted path into the module's configuration.
    pub fn set_config(&mut self, path: &str, value: Value) {
        *self.config = set_path(self.config, path, value);
    }

    /// The whole configuration document.
    #[must_use]
    pub fn config(&self) -> &Value {
        self.config
    }

    /// The owning module's name.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The shared container, for lookups the typed
    /// [`service`](Self::service) helper cannot express.
    #[must_use]
    pub fn container(&self) -> &Arc<ServiceContainer> {
        self.container
    }

    /// The shared event bus.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        self.bus
    }
}
