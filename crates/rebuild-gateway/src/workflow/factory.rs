//! Route selection.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::engine::EngineFactory;
use crate::transfer::FileTransfer;

use super::{RebuildKind, RebuildWorkflow, RequestWorkflow, StatusCodeWorkflow, WorkflowRequest};

/// Pick the workflow for `request`.
///
/// Paths are matched case-insensitively by substring, so prefixes added by a
/// hosting proxy do not matter.
pub fn select(
    request: WorkflowRequest,
    engines: Arc<dyn EngineFactory>,
    transfer: Arc<dyn FileTransfer>,
) -> Box<dyn RequestWorkflow> {
    let path = request.path.to_lowercase();
    let method = request.method.clone();

    if let Some(kind) = rebuild_kind(&method, &path) {
        return Box::new(RebuildWorkflow::new(kind, request, engines, transfer));
    }

    if method == Method::PUT && path.contains("/api/v1/dummy") {
        Box::new(
            StatusCodeWorkflow::new("dummy", request, StatusCode::OK)
                .with_header("etag", "\"dummy\"")
                .with_json(json!({ "Yes": true })),
        )
    } else if method == Method::GET && path.contains("/api/v1/health") {
        Box::new(StatusCodeWorkflow::new("health", request, StatusCode::OK))
    } else {
        tracing::info!(%path, %method, "no route matched");
        Box::new(StatusCodeWorkflow::new("not_found", request, StatusCode::NOT_FOUND))
    }
}

fn rebuild_kind(method: &Method, path: &str) -> Option<RebuildKind> {
    if *method != Method::POST {
        return None;
    }
    if path.contains("/api/v1/rebuild/url") {
        Some(RebuildKind::Url)
    } else if path.contains("/api/v1/rebuild/base64") {
        Some(RebuildKind::Base64)
    } else if path.contains("/api/v1/rebuild/file") {
        Some(RebuildKind::FormFile)
    } else {
        None
    }
}
