//! ModuleHost - drives a module (and its children) through the
//! lifecycle.
//!
//! ```text
//! initialize(container, bus)
//!     │ state check ──▶ MODULE_ALREADY_INITIALIZED
//!     │ dependency presence ──▶ MODULE_DEPENDENCY_MISSING (revert)
//!     │ on_initialize(ctx) ──▶ MODULE_INIT_FAILED (revert + unsubscribe)
//!     │ children, in order ──▶ MODULE_INIT_FAILED (revert)
//!     ▼
//! initialized ──▶ publish "module:initialized"
//!
//! destroy()
//!     │ children, reverse order
//!     │ on_destroy
//!     │ release tracked subscriptions
//!     ▼
//! destroyed (terminal, idempotent)
//! ```
//!
//! The host owns its children by value and links them to the parent by
//! name, so a module tree is a plain owned hierarchy with no back
//! references.

use crate::{LifecycleState, Module, ModuleCtx, ModuleError};
use keel_bus::{BusError, EventBus, SubscribeOptions, SubscriptionHandle};
use keel_container::ServiceContainer;
use keel_types::{get_path, set_path};
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

/// Snapshot of a host's public state, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    /// Module name.
    pub name: String,
    /// Current lifecycle state.
    pub state: LifecycleState,
    /// Declared service dependencies.
    pub dependencies: Vec<String>,
    /// Parent module name, if attached as a child.
    pub parent: Option<String>,
    /// Child module names, in attach order.
    pub children: Vec<String>,
    /// Live tracked subscriptions.
    pub subscriptions: usize,
}

/// Owns a [`Module`] and runs its lifecycle.
pub struct ModuleHost {
    module: Box<dyn Module>,
    state: LifecycleState,
    config: Value,
    subscriptions: Vec<SubscriptionHandle>,
    children: Vec<ModuleHost>,
    parent: Option<String>,
    container: Option<Arc<ServiceContainer>>,
    bus: Option<EventBus>,
}

impl ModuleHost {
    /// Wraps a module with empty configuration.
    #[must_use]
    pub fn new(module: impl Module + 'static) -> Self {
        Self::with_config(module, json!({}))
    }

    /// Wraps a module with an initial configuration document.
    #[must_use]
    pub fn with_config(module: impl Module + 'static, config: Value) -> Self {
        Self {
            module: Box::new(module),
            state: LifecycleState::Uninitialized,
            config,
            subscriptions: Vec::new(),
            children: Vec::new(),
            parent: None,
            container: None,
            bus: None,
        }
    }

    /// The module's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.module.name()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Initializes the module, then its children in attach order.
    ///
    /// Any failure reverts this host to `uninitialized` and releases
    /// every tracked subscription, so initialization can be retried
    /// once the cause is fixed. Children that had already initialized
    /// before a sibling failed are destroyed. On success the host
    /// publishes `module:initialized` on the bus.
    pub async fn initialize(
        &mut self,
        container: &Arc<ServiceContainer>,
        bus: &EventBus,
    ) -> Result<(), ModuleError> {
        let name = self.module.name().to_string();
        if self.state != LifecycleState::Uninitialized {
            return Err(ModuleError::AlreadyInitialized {
                module: name,
                state: self.state,
            });
        }
        self.state = LifecycleState::Initializing;
        tracing::debug!(module = %name, "initializing module");

        for dependency in self.module.dependencies() {
            if !container.has(dependency) {
                self.state = LifecycleState::Uninitialized;
                return Err(ModuleError::DependencyMissing {
                    module: name,
                    dependency: (*dependency).to_string(),
                });
            }
        }

        let hook_result = {
            let ModuleHost {
                module,
                subscriptions,
                config,
                ..
            } = &mut *self;
            let mut ctx = ModuleCtx {
                container,
                bus,
                subscriptions,
                config,
                module: name.clone(),
            };
            module.on_initialize(&mut ctx).await
        };
        if let Err(error) = hook_result {
            self.revert(&name, &error.to_string());
            return Err(ModuleError::InitFailed {
                module: name,
                reason: error.to_string(),
            });
        }

        let mut child_failure: Option<ModuleError> = None;
        for index in 0..self.children.len() {
            if let Err(error) = Box::pin(self.children[index].initialize(container, bus)).await {
                child_failure = Some(error);
                break;
            }
        }
        if let Some(error) = child_failure {
            for child in &mut self.children {
                if child.state == LifecycleState::Initialized {
                    Box::pin(child.destroy()).await;
                }
            }
            self.revert(&name, &error.to_string());
            return Err(ModuleError::InitFailed {
                module: name,
                reason: error.to_string(),
            });
        }

        self.container = Some(Arc::clone(container));
        self.bus = Some(bus.clone());
        self.state = LifecycleState::Initialized;
        bus.publish("module:initialized", json!({ "module": name })).await;
        Ok(())
    }

    fn revert(&mut self, name: &str, reason: &str) {
        tracing::warn!(module = %name, %reason, "module initialization failed; reverting");
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.state = LifecycleState::Uninitialized;
    }

    /// Destroys the module: children first in reverse attach order,
    /// then `on_destroy`, then tracked subscriptions. Idempotent; a
    /// destroyed module stays destroyed.
    pub async fn destroy(&mut self) {
        if self.state == LifecycleState::Destroyed {
            return;
        }
        tracing::debug!(module = %self.module.name(), "destroying module");
        for child in self.children.iter_mut().rev() {
            Box::pin(child.destroy()).await;
        }
        if self.state != LifecycleState::Uninitialized {
            self.module.on_destroy().await;
        }
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        self.container = None;
        self.bus = None;
        self.state = LifecycleState::Destroyed;
    }

    /// Attaches a child module.
    ///
    /// Child names must be unique within a parent. If this host is
    /// already initialized the child is initialized immediately with
    /// the same container and bus; otherwise it waits for the parent's
    /// own initialization.
    pub async fn add_child(&mut self, mut child: ModuleHost) -> Result<(), ModuleError> {
        let child_name = child.module.name().to_string();
        if self.children.iter().any(|c| c.module.name() == child_name) {
            return Err(ModuleError::ChildExists {
                module: self.module.name().to_string(),
                child: child_name,
            });
        }
        child.parent = Some(self.module.name().to_string());

        if self.state == LifecycleState::Initialized {
            let (Some(container), Some(bus)) = (self.container.clone(), self.bus.clone()) else {
                return Err(ModuleError::NotInitialized {
                    module: self.module.name().to_string(),
                });
            };
            Box::pin(child.initialize(&container, &bus)).await?;
        }
        self.children.push(child);
        Ok(())
    }

    /// Destroys and detaches a child by name. Returns whether a child
    /// was removed.
    pub async fn remove_child(&mut self, name: &str) -> bool {
        let Some(index) = self.children.iter().position(|c| c.module.name() == name) else {
            return false;
        };
        let mut child = self.children.remove(index);
        child.destroy().await;
        true
    }

    /// Resolves a service from the container this module was
    /// initialized with.
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ModuleError> {
        let Some(container) = &self.container else {
            return Err(ModuleError::NotInitialized {
                module: self.module.name().to_string(),
            });
        };
        Ok(container.resolve::<T>(name)?)
    }

    /// Subscribes to a bus event after initialization, tracked for
    /// cleanup on destroy.
    pub fn subscribe<F, Fut>(
        &mut self,
        event: impl Into<String>,
        handler: F,
        options: SubscribeOptions,
    ) -> Result<(), ModuleError>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BusError>> + Send + 'static,
    {
        let Some(bus) = &self.bus else {
            return Err(ModuleError::NotInitialized {
                module: self.module.name().to_string(),
            });
        };
        let handle = bus.subscribe(event, handler, options);
        self.subscriptions.push(handle);
        Ok(())
    }

    /// Publishes an event on the module's bus.
    ///
    /// Tolerant before initialization: logs and reports zero
    /// deliveries instead of failing, so modules may emit
    /// optimistically from any state.
    pub async fn emit(&self, event: &str, payload: Value) -> usize {
        match &self.bus {
            Some(bus) => bus.publish(event, payload).await,
            None => {
                tracing::warn!(
                    module = %self.module.name(),
                    event = %event,
                    "emit before initialization; dropping event"
                );
                0
            }
        }
    }

    /// Reads a dotted path from the module's configuration.
    #[must_use]
    pub fn get_config(&self, path: &str) -> Option<Value> {
        get_path(&self.config, path).cloned()
    }

    /// Writes a dotted path into the module's configuration.
    pub fn set_config(&mut self, path: &str, value: Value) {
        self.config = set_path(&self.config, path, value);
    }

    /// Borrows a child host by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&ModuleHost> {
        self.children.iter().find(|c| c.module.name() == name)
    }

    /// Diagnostic snapshot of the host.
    #[must_use]
    pub fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.module.name().to_string(),
            state: self.state,
            dependencies: self
                .module
                .dependencies()
                .iter()
                .map(|d| (*d).to_string())
                .collect(),
            parent: self.parent.clone(),
            children: self
                .children
                .iter()
                .map(|c| c.module.name().to_string())
                .collect(),
            subscriptions: self.subscriptions.len(),
        }
    }
}

impl std::fmt::Debug for ModuleHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHost")
            .field("name", &self.module.name())
            .field("state", &self.state)
            .field("children", &self.children.len())
            .finish()
    }
}
