//! In-process metrics.
//!
//! Workflow results and durations are recorded by the HTTP adapter and
//! rendered in Prometheus text format by the `/metrics` handler.

pub mod metrics;
