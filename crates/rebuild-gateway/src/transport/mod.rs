//! Transport layer (HTTP).
//!
//! Converts axum requests into workflow requests and workflow responses back.

pub mod http;
