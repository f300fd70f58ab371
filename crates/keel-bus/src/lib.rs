//! # keel-bus
//!
//! Priority-ordered asynchronous event bus for the keel runtime.
//!
//! Decoupled parts of an application talk through named events instead
//! of direct references: modules publish, modules subscribe, and
//! neither side knows the other exists.
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`EventBus`] | Shared publish/subscribe hub |
//! | [`SubscribeOptions`] | Priority and once flags per subscription |
//! | [`SubscriptionHandle`] | Explicit, idempotent unsubscribe |
//! | [`BusError`] | Timeout / cancellation / handler failures |
//!
//! ## Quick Start
//!
//! ```
//! use keel_bus::{EventBus, SubscribeOptions};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new();
//!
//! bus.subscribe(
//!     "user:login",
//!     |payload| async move {
//!         tracing::debug!(?payload, "user logged in");
//!         Ok(())
//!     },
//!     SubscribeOptions::with_priority(10),
//! );
//!
//! bus.publish("user:login", json!({"id": 42})).await;
//! # }
//! ```

pub mod bus;
pub mod error;

pub use bus::{EventBus, HandlerFuture, MiddlewareFuture, SubscribeOptions, SubscriptionHandle};
pub use error::BusError;
