//! Rebuild workflows.
//!
//! One orchestration shared by the three entry points:
//!
//! 1. validate the request into its model
//! 2. acquire input bytes (download / base64 decode / form field)
//! 3. open an engine session
//! 4. detect the file type; `Unknown` answers 422
//! 5. push the policy
//! 6. rebuild and classify the outcome
//! 7. emit the output (upload / base64 / attachment)
//!
//! The engine session is held by a guard that disposes it on every exit,
//! early returns and propagated errors included. Variants differ only in
//! steps 2 and 7 and in the metric headers they populate.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::Instrument;

use rebuild_core::engine::{FileType, UNKNOWN_FILE_TYPE};
use rebuild_core::error::{ErrorClass, RebuildError};
use rebuild_core::metric::{self, Stopwatch};
use rebuild_core::outcome::{classify_failure, RebuildOutcome};
use rebuild_core::policy::ContentManagementPolicy;

use crate::engine::{EngineFactory, EngineSession};
use crate::models::{Base64Request, FieldErrors, FormFileRequest, UrlRequest};
use crate::transfer::{parse_multipart_form, FileTransfer};

use super::{
    RequestWorkflow, ResponseBody, ResponseHeaders, WorkflowRequest, WorkflowResponse,
    CONTENT_TYPE, OCTET_STREAM,
};

pub const DOWNLOAD_FAILED: &str = "Could not download input file";
pub const UPLOAD_FAILED: &str = "Could not upload rebuilt file.";
pub const INVALID_BASE64: &str = "Could not parse base64 of input file";

/// Metric headers every variant writes once an engine session is open.
pub const SHARED_METRIC_KEYS: &[&str] = &[
    metric::ENGINE_LOAD_TIME,
    metric::VERSION,
    metric::DETECT_FILE_TYPE_TIME,
    metric::FILE_TYPE,
    metric::REBUILD_TIME,
    metric::PROTECTED_FILE_SIZE,
];

/// Entry point variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildKind {
    /// Download from `InputGetUrl`, upload to `OutputPutUrl`.
    Url,
    /// Base64 in, base64 out.
    Base64,
    /// Multipart file in, attachment out.
    FormFile,
}

impl RebuildKind {
    pub fn name(self) -> &'static str {
        match self {
            RebuildKind::Url => "rebuild_url",
            RebuildKind::Base64 => "rebuild_base64",
            RebuildKind::FormFile => "rebuild_file",
        }
    }

    /// Metric headers written by this variant's acquire and emit steps, on top
    /// of [`SHARED_METRIC_KEYS`].
    pub fn metric_keys(self) -> &'static [&'static str] {
        match self {
            RebuildKind::Url => &[
                metric::DOWNLOAD_TIME,
                metric::FILE_SIZE,
                metric::UPLOAD_ETAG,
                metric::UPLOAD_TIME,
                metric::UPLOAD_SIZE,
            ],
            RebuildKind::Base64 => &[metric::BASE64_DECODE_TIME, metric::FILE_SIZE],
            RebuildKind::FormFile => &[metric::FORM_FILE_READ_TIME, metric::FILE_SIZE],
        }
    }
}

/// Where the rebuilt bytes go.
enum OutputSink {
    Upload {
        url: String,
        headers: BTreeMap<String, String>,
    },
    Base64,
    Attachment {
        file_name: Option<String>,
    },
}

struct Acquired {
    bytes: Bytes,
    policy: ContentManagementPolicy,
    sink: OutputSink,
}

/// Early exit from the orchestration.
enum Exit {
    /// Handled locally: final status and body.
    Respond(StatusCode, Value),
    /// Propagated to the top-level classifier.
    Fail(RebuildError),
}

impl Exit {
    fn invalid(errors: FieldErrors) -> Self {
        Exit::Respond(StatusCode::BAD_REQUEST, json!({ "errors": errors }))
    }
}

impl From<RebuildError> for Exit {
    fn from(e: RebuildError) -> Self {
        Exit::Fail(e)
    }
}

/// Disposes the session when dropped.
struct EngineGuard(Box<dyn EngineSession>);

impl Deref for EngineGuard {
    type Target = dyn EngineSession;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        self.0.dispose();
        tracing::debug!("engine session disposed");
    }
}

pub struct RebuildWorkflow {
    kind: RebuildKind,
    request: WorkflowRequest,
    response: WorkflowResponse,
    engines: Arc<dyn EngineFactory>,
    transfer: Arc<dyn FileTransfer>,
}

impl RebuildWorkflow {
    pub fn new(
        kind: RebuildKind,
        request: WorkflowRequest,
        engines: Arc<dyn EngineFactory>,
        transfer: Arc<dyn FileTransfer>,
    ) -> Self {
        Self {
            kind,
            request,
            response: WorkflowResponse::new(
                StatusCode::OK,
                ResponseHeaders::with_metric_defaults(
                    SHARED_METRIC_KEYS.iter().chain(kind.metric_keys()).copied(),
                ),
            ),
            engines,
            transfer,
        }
    }

    pub fn kind(&self) -> RebuildKind {
        self.kind
    }

    async fn run(&mut self) -> Result<(), Exit> {
        let acquired = self.acquire().await?;

        let engine = self.open_engine()?;

        let file_type = self.detect(&engine, &acquired.bytes);
        if file_type.name() == UNKNOWN_FILE_TYPE {
            tracing::info!("unsupported file type");
            return Err(Exit::Respond(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": RebuildError::UnsupportedFileType.to_string() }),
            ));
        }

        engine.set_configuration(&acquired.policy)?;

        let outcome = self.rebuild(&engine, &acquired.bytes, file_type)?;
        if !outcome.is_success() {
            self.engine_failure(&outcome);
            return Ok(());
        }

        let protected = Bytes::from(outcome.into_protected().unwrap_or_default());
        self.emit(acquired.sink, protected).await
    }

    async fn acquire(&mut self) -> Result<Acquired, Exit> {
        match self.kind {
            RebuildKind::Url => {
                let req = UrlRequest::parse(self.request.body_bytes()).map_err(Exit::invalid)?;

                let timer = Stopwatch::start_new();
                let bytes = match self.transfer.download_file(&req.input_get_url).await {
                    Ok(bytes) if !bytes.is_empty() => bytes,
                    Ok(_) => return Err(download_failed("File did not contain any data")),
                    Err(e) => return Err(download_failed(&e.to_string())),
                };
                self.response.headers.set(metric::DOWNLOAD_TIME, timer.elapsed_header());
                self.response.headers.set(metric::FILE_SIZE, bytes.len());
                tracing::info!(len = bytes.len(), "file downloaded");

                let mut headers = BTreeMap::new();
                headers.insert("x-ms-blob-type".to_string(), "BlockBlob".to_string());
                headers.insert(CONTENT_TYPE.to_string(), OCTET_STREAM.to_string());
                headers.extend(req.output_put_url_request_headers);

                Ok(Acquired {
                    bytes,
                    policy: req.policy,
                    sink: OutputSink::Upload {
                        url: req.output_put_url,
                        headers,
                    },
                })
            }
            RebuildKind::Base64 => {
                let req = Base64Request::parse(self.request.body_bytes()).map_err(Exit::invalid)?;

                let timer = Stopwatch::start_new();
                let bytes = match STANDARD.decode(req.base64.trim()) {
                    Ok(bytes) if !bytes.is_empty() => Bytes::from(bytes),
                    Ok(_) => return Err(invalid_base64()),
                    Err(e) => {
                        tracing::info!(error = %e, "base64 decode failed");
                        return Err(invalid_base64());
                    }
                };
                self.response.headers.set(metric::BASE64_DECODE_TIME, timer.elapsed_header());
                self.response.headers.set(metric::FILE_SIZE, bytes.len());

                Ok(Acquired {
                    bytes,
                    policy: req.policy,
                    sink: OutputSink::Base64,
                })
            }
            RebuildKind::FormFile => {
                let timer = Stopwatch::start_new();
                let parts = match self.request.body.clone() {
                    Some(body) => match parse_multipart_form(body, &self.request.headers).await {
                        Ok(parts) => {
                            self.response
                                .headers
                                .set(metric::FORM_FILE_READ_TIME, timer.elapsed_header());
                            Some(parts)
                        }
                        Err(e) => {
                            tracing::info!(error = %e, "could not read form");
                            None
                        }
                    },
                    None => None,
                };

                let req = FormFileRequest::from_parts(parts).map_err(Exit::invalid)?;
                self.response.headers.set(metric::FILE_SIZE, req.file.len());
                tracing::info!(len = req.file.len(), "file found in form");

                Ok(Acquired {
                    bytes: req.file,
                    policy: req.policy,
                    sink: OutputSink::Attachment {
                        file_name: req.file_name,
                    },
                })
            }
        }
    }

    fn open_engine(&mut self) -> Result<EngineGuard, Exit> {
        let timer = Stopwatch::start_new();
        let engine = EngineGuard(self.engines.create()?);
        let version = engine.library_version();

        self.response.headers.set(metric::ENGINE_LOAD_TIME, timer.elapsed_header());
        self.response.headers.set(metric::VERSION, &version);
        tracing::info!(%version, "engine loaded");

        Ok(engine)
    }

    fn detect(&mut self, engine: &EngineGuard, bytes: &[u8]) -> FileType {
        let timer = Stopwatch::start_new();
        let file_type = engine.file_type(bytes);

        self.response.headers.set(metric::DETECT_FILE_TYPE_TIME, timer.elapsed_header());
        self.response.headers.set(metric::FILE_TYPE, file_type.name());
        tracing::info!(file_type = file_type.name(), "file type detected");

        file_type
    }

    fn rebuild(
        &mut self,
        engine: &EngineGuard,
        bytes: &[u8],
        file_type: FileType,
    ) -> Result<RebuildOutcome, Exit> {
        let timer = Stopwatch::start_new();
        let outcome = engine.rebuild(bytes, file_type)?;

        self.response.headers.set(metric::REBUILD_TIME, timer.elapsed_header());
        self.response
            .headers
            .set(metric::PROTECTED_FILE_SIZE, outcome.protected_len());
        tracing::info!(len = outcome.protected_len(), outcome = %outcome.outcome_name(), "rebuild finished");

        Ok(outcome)
    }

    fn engine_failure(&mut self, outcome: &RebuildOutcome) {
        let class = classify_failure(outcome.error_message());
        let status = StatusCode::from_u16(class.http_status()).unwrap_or(StatusCode::UNPROCESSABLE_ENTITY);

        tracing::info!(?class, outcome = %outcome.outcome_name(), "engine did not produce a file");
        self.response.respond(
            status,
            json!({
                "error": outcome.error_message().unwrap_or_default(),
                "engineOutcome": outcome.outcome().code(),
                "engineOutcomeName": outcome.outcome_name(),
            }),
        );
    }

    async fn emit(&mut self, sink: OutputSink, protected: Bytes) -> Result<(), Exit> {
        match sink {
            OutputSink::Upload { url, headers } => {
                let timer = Stopwatch::start_new();
                let len = protected.len();
                let etag = self
                    .transfer
                    .upload_file(&url, &headers, protected)
                    .await
                    .map_err(|e| {
                        tracing::warn!(error = %e, "could not upload protected file");
                        Exit::Respond(
                            StatusCode::BAD_REQUEST,
                            json!({ "error": UPLOAD_FAILED, "detail": e.to_string() }),
                        )
                    })?;

                self.response.headers.set(metric::UPLOAD_ETAG, &etag);
                self.response.headers.set(metric::UPLOAD_TIME, timer.elapsed_header());
                self.response.headers.set(metric::UPLOAD_SIZE, len);
                self.response.respond(StatusCode::OK, json!({}));
            }
            OutputSink::Base64 => {
                self.response
                    .respond(StatusCode::OK, json!({ "Base64": STANDARD.encode(&protected) }));
            }
            OutputSink::Attachment { file_name } => {
                let headers = &mut self.response.headers;
                headers.set("Content-Disposition", content_disposition(file_name.as_deref()));
                headers.set("Content-Length", protected.len());
                headers.set(CONTENT_TYPE, OCTET_STREAM);
                self.response.status = StatusCode::OK;
                self.response.body = ResponseBody::Bytes(protected);
            }
        }
        Ok(())
    }

    /// Top-level classification of a propagated error.
    fn fail(&mut self, e: RebuildError) {
        let class = e.class();
        let status = match class {
            ErrorClass::EngineFailure => classify_failure(e.engine_error()).http_status(),
            other => other.http_status(),
        };
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                class = class.as_str(),
                error = %error_chain(&e),
                "workflow failed"
            );
        } else {
            tracing::warn!(class = class.as_str(), error = %e, "workflow rejected");
        }

        self.response.respond(status, json!({ "error": e.to_string() }));
    }
}

#[async_trait]
impl RequestWorkflow for RebuildWorkflow {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn request(&self) -> &WorkflowRequest {
        &self.request
    }

    fn response(&self) -> &WorkflowResponse {
        &self.response
    }

    async fn handle(&mut self) {
        let span = tracing::info_span!("workflow", name = self.kind.name(), path = %self.request.path);
        let result = self.run().instrument(span.clone()).await;

        span.in_scope(|| match result {
            Ok(()) => {}
            Err(Exit::Respond(status, body)) => self.response.respond(status, body),
            Err(Exit::Fail(e)) => self.fail(e),
        });
    }

    fn into_response(self: Box<Self>) -> WorkflowResponse {
        self.response
    }
}

fn download_failed(detail: &str) -> Exit {
    tracing::warn!(%detail, "could not download input file");
    Exit::Respond(
        StatusCode::BAD_REQUEST,
        json!({ "error": DOWNLOAD_FAILED, "detail": detail }),
    )
}

fn invalid_base64() -> Exit {
    Exit::Respond(
        StatusCode::BAD_REQUEST,
        json!({ "errors": { "Base64": INVALID_BASE64 } }),
    )
}

/// `error: source: source ...`
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut out = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        out.push_str(": ");
        out.push_str(&s.to_string());
        source = s.source();
    }
    out
}

/// `attachment` header value, with an RFC 5987 `filename*` for non-ASCII names.
fn content_disposition(file_name: Option<&str>) -> String {
    let Some(name) = file_name.filter(|n| !n.is_empty()) else {
        return "attachment".to_string();
    };

    let fallback: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect();

    if fallback == name {
        return format!("attachment; filename=\"{fallback}\"");
    }

    let mut encoded = String::new();
    for b in name.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
