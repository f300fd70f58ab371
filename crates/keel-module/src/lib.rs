//! # keel-module
//!
//! Composable module lifecycle for the keel runtime.
//!
//! A module is an application building block with a name, declared
//! service dependencies, and two async lifecycle hooks. The
//! [`ModuleHost`] drives it through a strict state machine, tracks its
//! bus subscriptions for automatic cleanup, and manages an owned tree
//! of child modules.
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Module`] | Trait implemented by application modules |
//! | [`ModuleHost`] | Lifecycle driver, children, tracked cleanup |
//! | [`ModuleCtx`] | Capabilities handed to `on_initialize` |
//! | [`LifecycleState`] | uninitialized / initializing / initialized / destroyed |
//! | [`ModuleError`] | Lifecycle misuse and init failures |
//!
//! ## Quick Start
//!
//! ```
//! use async_trait::async_trait;
//! use keel_bus::EventBus;
//! use keel_container::ServiceContainer;
//! use keel_module::{Module, ModuleCtx, ModuleError, ModuleHost};
//! use std::sync::Arc;
//!
//! struct Heartbeat;
//!
//! #[async_trait]
//! impl Module for Heartbeat {
//!     fn name(&self) -> &str {
//!         "heartbeat"
//!     }
//!
//!     async fn on_initialize(&mut self, ctx: &mut ModuleCtx<'_>) -> Result<(), ModuleError> {
//!         ctx.subscribe("tick", |_| async { Ok(()) });
//!         Ok(())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let container = Arc::new(ServiceContainer::new());
//! let bus = EventBus::new();
//!
//! let mut host = ModuleHost::new(Heartbeat);
//! host.initialize(&container, &bus).await.unwrap();
//! assert!(host.state().is_active());
//!
//! host.destroy().await;
//! # }
//! ```

pub mod error;
pub mod host;
pub mod lifecycle;
pub mod module;

pub use error::ModuleError;
pub use host::{ModuleHost, ModuleInfo};
pub use lifecycle::LifecycleState;
pub use module::{Module, ModuleCtx};
