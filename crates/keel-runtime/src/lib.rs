//! # keel-runtime
//!
//! Application runtime composing the keel subsystems into one
//! explicit, bootable instance:
//!
//! ```text
//! ┌───────────────────────── Runtime ─────────────────────────┐
//! │                                                           │
//! │  ServiceContainer        EventBus          StateStore     │
//! │  (keel-container)        (keel-bus)        (keel-store,   │
//! │        ▲                     ▲              as a service) │
//! │        └────────┬────────────┘                            │
//! │                 │                                         │
//! │            ModuleHost tree (keel-module)                  │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use keel_runtime::{RuntimeBuilder, StoreOptions};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut runtime = RuntimeBuilder::new()
//!     .with_store("store", json!({"docs": {}}), StoreOptions::default())
//!     .build();
//!
//! runtime.boot().await.unwrap();
//! runtime.bus().publish("app:started", json!({})).await;
//! runtime.shutdown().await;
//! # }
//! ```

pub mod error;
pub mod runtime;

pub use error::RuntimeError;
pub use runtime::{Runtime, RuntimeBuilder};

pub use keel_bus::{BusError, EventBus, SubscribeOptions, SubscriptionHandle};
pub use keel_container::{ContainerError, Lifecycle, Registration, ServiceContainer, ServiceInstance};
pub use keel_module::{LifecycleState, Module, ModuleCtx, ModuleError, ModuleHost, ModuleInfo};
pub use keel_store::{kinds, Action, DispatchOutcome, Selector, StateStore, StoreOptions};
pub use keel_types::ErrorCode;
