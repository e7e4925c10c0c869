//! Request workflows.
//!
//! A workflow owns one request and the response it builds. `handle` mutates
//! the response in place and never fails past its own boundary; every error
//! ends up as a status code and body.

pub mod factory;
pub mod rebuild;
pub mod status;

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::http::{HeaderMap, Method, StatusCode};
use bytes::Bytes;
use serde_json::Value;

use rebuild_core::metric;

pub use factory::select;
pub use rebuild::{RebuildKind, RebuildWorkflow};
pub use status::StatusCodeWorkflow;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Transport-neutral inbound request.
#[derive(Debug, Clone)]
pub struct WorkflowRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// `None` when the request carried no body.
    pub body: Option<Bytes>,
}

impl WorkflowRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: axum::http::HeaderName, value: &str) -> Self {
        if let Ok(v) = axum::http::HeaderValue::from_str(value) {
            self.headers.insert(name, v);
        }
        self
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Open string map of response headers, metric headers included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(BTreeMap<String, String>);

impl ResponseHeaders {
    /// `keys` seeded with `NOT SET`, plus a JSON content type.
    pub fn with_metric_defaults<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut headers = Self::default();
        for name in keys {
            headers.set(name, metric::NOT_SET);
        }
        headers.set(CONTENT_TYPE, APPLICATION_JSON);
        headers
    }

    pub fn set(&mut self, name: &str, value: impl ToString) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Bytes(Bytes),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            ResponseBody::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkflowResponse {
    pub status: StatusCode,
    pub headers: ResponseHeaders,
    pub body: ResponseBody,
}

impl WorkflowResponse {
    pub fn new(status: StatusCode, headers: ResponseHeaders) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::Empty,
        }
    }

    pub(crate) fn respond(&mut self, status: StatusCode, body: Value) {
        self.status = status;
        self.body = ResponseBody::Json(body);
    }
}

/// A unit of request handling selected by [`select`].
#[async_trait]
pub trait RequestWorkflow: Send {
    /// Stable name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn request(&self) -> &WorkflowRequest;

    fn response(&self) -> &WorkflowResponse;

    /// Process the request. Never fails; outcomes are written to the response.
    async fn handle(&mut self);

    fn into_response(self: Box<Self>) -> WorkflowResponse;
}
