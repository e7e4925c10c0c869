//! Axum router wiring.
//!
//! Ops endpoints are routed explicitly; everything else goes to the workflow
//! adapter, which selects by path and method.

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.cfg().gateway.max_body_bytes;

    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .fallback(transport::http::handle)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
