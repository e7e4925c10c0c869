//! Rebuild gateway library entry.
//!
//! Wires config, engine sessions, file transfer, and the rebuild workflows
//! into an axum service. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod engine;
pub mod models;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transfer;
pub mod transport;
pub mod workflow;
