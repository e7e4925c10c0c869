//! HTTP adapter: axum request -> workflow -> axum response.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
};

use rebuild_core::metric;

use crate::app_state::AppState;
use crate::workflow::{self, ResponseBody, WorkflowRequest, WorkflowResponse};

/// Headers added to every workflow response.
const SECURITY_HEADERS: [(HeaderName, &str); 3] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::CACHE_CONTROL, "no-cache"),
    (header::PRAGMA, "no-cache"),
];

pub async fn handle(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = WorkflowRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body: (!body.is_empty()).then_some(body),
    };

    let mut wf = workflow::select(request, state.engines(), state.transfer());
    let name = wf.name();
    let metrics = state.metrics();

    metrics.workflows_in_flight.inc(&[("workflow", name)]);
    let started = std::time::Instant::now();
    wf.handle().await;
    let elapsed = started.elapsed();
    metrics.workflows_in_flight.dec(&[("workflow", name)]);

    let response = wf.into_response();
    let status = response.status.as_u16().to_string();
    metrics
        .workflow_results
        .inc(&[("workflow", name), ("status", &status)]);
    metrics.workflow_duration.observe(&[("workflow", name)], elapsed);
    if let Some(file_type) = response
        .headers
        .get(metric::FILE_TYPE)
        .filter(|t| *t != metric::NOT_SET)
    {
        metrics.detected_file_types.inc(&[("file_type", file_type)]);
    }

    tracing::info!(workflow = name, status = %status, elapsed_ms = elapsed.as_millis() as u64, "request handled");
    into_http(response)
}

/// Render a workflow response. Header entries that are not valid HTTP are
/// dropped with a warning.
pub fn into_http(response: WorkflowResponse) -> Response {
    let body = match response.body {
        ResponseBody::Empty => Body::empty(),
        ResponseBody::Json(value) => Body::from(value.to_string()),
        ResponseBody::Bytes(bytes) => Body::from(bytes),
    };

    let mut out = (response.status, body).into_response();
    let headers = out.headers_mut();

    for (name, value) in response.headers.iter() {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(%name, "dropping invalid response header"),
        }
    }
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    out
}
