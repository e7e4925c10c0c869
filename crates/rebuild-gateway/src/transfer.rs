//! External I/O collaborators: HTTP download/upload and multipart form parsing.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use bytes::Bytes;

use rebuild_core::error::{RebuildError, Result};

/// ETag reported when the upload target returns none.
pub const EMPTY_ETAG: &str = "\"\"";

/// Fetches input files and stores rebuilt ones.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// GET `url`. Non-2xx answers fail with the status text.
    async fn download_file(&self, url: &str) -> Result<Bytes>;

    /// PUT `bytes` to `url` and return the ETag, or [`EMPTY_ETAG`].
    async fn upload_file(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        bytes: Bytes,
    ) -> Result<String>;
}

/// [`FileTransfer`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFileTransfer {
    client: reqwest::Client,
}

impl HttpFileTransfer {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RebuildError::Config(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

#[async_trait]
impl FileTransfer for HttpFileTransfer {
    async fn download_file(&self, url: &str) -> Result<Bytes> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| RebuildError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RebuildError::Transport(status_text(resp.status())));
        }

        resp.bytes()
            .await
            .map_err(|e| RebuildError::Transport(e.to_string()))
    }

    async fn upload_file(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        bytes: Bytes,
    ) -> Result<String> {
        let mut req = self.client.put(url).body(bytes);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| RebuildError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(RebuildError::Transport(status_text(resp.status())));
        }

        Ok(resp
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| EMPTY_ETAG.to_string()))
    }
}

/// One multipart field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// Lower-cased field name.
    pub field_name: String,
    pub data: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

/// Split a `multipart/form-data` body into its parts.
pub async fn parse_multipart_form(body: Bytes, headers: &HeaderMap) -> Result<Vec<FormPart>> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or(RebuildError::ArgumentNull {
            argument: "content-type",
        })?;

    let boundary = multer::parse_boundary(content_type).map_err(|e| RebuildError::Argument {
        argument: "content-type",
        message: e.to_string(),
    })?;

    let stream = futures_util::stream::once(async move { Ok::<Bytes, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let field_name = field.name().unwrap_or_default().to_lowercase();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(|m| m.to_string());
        let data = field.bytes().await.map_err(form_error)?;

        parts.push(FormPart {
            field_name,
            data,
            file_name,
            content_type,
        });
    }

    Ok(parts)
}

fn form_error(e: multer::Error) -> RebuildError {
    RebuildError::Argument {
        argument: "form",
        message: e.to_string(),
    }
}
