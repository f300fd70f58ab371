//! Shared vocabulary for the keel runtime.
//!
//! This crate is the bottom of the dependency graph:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  keel-runtime  : composition root                   │
//! ├─────────────────────────────────────────────────────┤
//! │  keel-module   : lifecycle host                     │
//! ├──────────────┬───────────────┬──────────────────────┤
//! │  keel-bus    │ keel-container│  keel-store          │
//! ├──────────────┴───────────────┴──────────────────────┤
//! │  keel-types    : IDs, ErrorCode, path utils  ◄ HERE │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! It provides:
//!
//! - Typed UUID identifiers ([`SubscriptionId`], [`ActionId`])
//! - The [`ErrorCode`] trait for machine-readable error codes, with the
//!   [`assert_error_code`]/[`assert_error_codes`] test helpers
//! - Dotted-path utilities over [`serde_json::Value`] ([`get_path`],
//!   [`set_path`], [`merge_shallow`], [`merge_deep`])

mod error;
mod id;
mod path;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{ActionId, SubscriptionId};
pub use path::{get_path, merge_deep, merge_shallow, set_path};
