//! Top-level facade crate for the rebuild service.
//!
//! Re-exports the core engine/policy types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use rebuild_core::*;
}

pub mod gateway {
    pub use rebuild_gateway::*;
}
