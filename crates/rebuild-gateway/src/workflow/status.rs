//! Fixed-status workflow for health, the dummy upload target and unmatched routes.

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::Value;

use super::{RequestWorkflow, ResponseBody, ResponseHeaders, WorkflowRequest, WorkflowResponse};

pub struct StatusCodeWorkflow {
    name: &'static str,
    request: WorkflowRequest,
    response: WorkflowResponse,
}

impl StatusCodeWorkflow {
    pub fn new(name: &'static str, request: WorkflowRequest, status: StatusCode) -> Self {
        Self {
            name,
            request,
            response: WorkflowResponse::new(status, ResponseHeaders::default()),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.response.headers.set(name, value);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.response.body = ResponseBody::Json(body);
        self
    }
}

#[async_trait]
impl RequestWorkflow for StatusCodeWorkflow {
    fn name(&self) -> &'static str {
        self.name
    }

    fn request(&self) -> &WorkflowRequest {
        &self.request
    }

    fn response(&self) -> &WorkflowResponse {
        &self.response
    }

    async fn handle(&mut self) {
        tracing::debug!(
            workflow = self.name,
            method = %self.request.method,
            path = %self.request.path,
            status = self.response.status.as_u16(),
            "status code workflow"
        );
    }

    fn into_response(self: Box<Self>) -> WorkflowResponse {
        self.response
    }
}
