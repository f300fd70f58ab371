//! # keel-container
//!
//! Dependency-injection service container for the keel runtime.
//!
//! Services are registered by name with a provider and wiring
//! metadata, then resolved lazily with full dependency injection,
//! cycle detection, and singleton caching.
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ServiceContainer`] | Registration, resolution, boot/shutdown |
//! | [`Registration`] | Provider + dependencies + caching policy |
//! | [`ServiceInstance`] | Type-erased constructed service |
//! | [`Lifecycle`] | Optional boot/shutdown hooks per service |
//! | [`ContainerError`] | Wiring and construction failures |
//!
//! ## Quick Start
//!
//! ```
//! use keel_container::{Registration, ServiceContainer, ServiceInstance};
//!
//! struct Greeter {
//!     prefix: String,
//! }
//!
//! let mut container = ServiceContainer::new();
//! container.register("prefix", Registration::instance(String::from("hello")));
//! container.register(
//!     "greeter",
//!     Registration::build(|deps| {
//!         let prefix = deps[0].downcast::<String>().unwrap();
//!         Ok(ServiceInstance::new(Greeter {
//!             prefix: (*prefix).clone(),
//!         }))
//!     })
//!     .with_dependencies(&["prefix"]),
//! );
//!
//! let greeter = container.resolve::<Greeter>("greeter").unwrap();
//! assert_eq!(greeter.prefix, "hello");
//! ```

pub mod container;
pub mod error;
pub mod instance;
pub mod registration;

pub use container::ServiceContainer;
pub use error::ContainerError;
pub use instance::{Lifecycle, ServiceInstance};
pub use registration::{BuildFn, FactoryFn, Registration};
