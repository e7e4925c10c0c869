//! Rebuild core: native engine binding, content management policy, outcome
//! classification and the error surface shared with the gateway.
//!
//! The crate carries no HTTP or async runtime dependencies. Everything that
//! touches the engine goes through [`engine::EngineBinding`]; everything the
//! engine is told goes through [`policy::ContentManagementPolicy`].
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Native failures surface as `RebuildError`/`Result`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod engine;
pub mod error;
pub mod metric;
pub mod outcome;
pub mod policy;

/// Shared result type.
pub use error::{ErrorClass, RebuildError, Result};
