//! In-process engine and transfer doubles shared by workflow tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use rebuild_core::engine::{EngineOutcome, FileType};
use rebuild_core::error::{RebuildError, Result};
use rebuild_core::outcome::RebuildOutcome;
use rebuild_core::policy::ContentManagementPolicy;
use rebuild_gateway::engine::{EngineFactory, EngineSession};
use rebuild_gateway::transfer::FileTransfer;

/// What the fake engine answers.
#[derive(Debug, Clone)]
pub struct EngineScript {
    pub load_error: Option<String>,
    pub file_type: FileType,
    pub config_error: Option<String>,
    pub outcome: RebuildOutcome,
}

impl Default for EngineScript {
    fn default() -> Self {
        Self {
            load_error: None,
            file_type: FileType::Pdf,
            config_error: None,
            outcome: RebuildOutcome::success(b"OUT".to_vec()),
        }
    }
}

impl EngineScript {
    pub fn failing_with(message: &str) -> Self {
        Self {
            outcome: RebuildOutcome::failure(EngineOutcome::Error, Some(message.to_string())),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct EngineCalls {
    pub created: AtomicUsize,
    pub disposed: AtomicUsize,
    pub rebuilds: AtomicUsize,
    pub configs: Mutex<Vec<String>>,
    pub rebuilt_as: Mutex<Vec<String>>,
}

impl EngineCalls {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }
    pub fn rebuilds(&self) -> usize {
        self.rebuilds.load(Ordering::SeqCst)
    }
}

pub struct MockEngineFactory {
    pub script: EngineScript,
    pub calls: Arc<EngineCalls>,
}

impl MockEngineFactory {
    pub fn new(script: EngineScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: Arc::new(EngineCalls::default()),
        })
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(&self) -> Result<Box<dyn EngineSession>> {
        if let Some(e) = &self.script.load_error {
            return Err(RebuildError::EngineLoad(e.clone()));
        }
        self.calls.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            script: self.script.clone(),
            calls: self.calls.clone(),
            disposed: false,
        }))
    }
}

struct MockSession {
    script: EngineScript,
    calls: Arc<EngineCalls>,
    disposed: bool,
}

impl EngineSession for MockSession {
    fn library_version(&self) -> String {
        "1.2.3.4".to_string()
    }

    fn file_type(&self, _bytes: &[u8]) -> FileType {
        self.script.file_type
    }

    fn set_configuration(&self, policy: &ContentManagementPolicy) -> Result<()> {
        self.calls.configs.lock().unwrap().push(policy.serialize()?);
        match &self.script.config_error {
            Some(error) => Err(RebuildError::EngineConfiguration {
                outcome: EngineOutcome::Error.name(),
                error: error.clone(),
            }),
            None => Ok(()),
        }
    }

    fn rebuild(&self, _bytes: &[u8], file_type: FileType) -> Result<RebuildOutcome> {
        self.calls.rebuilds.fetch_add(1, Ordering::SeqCst);
        self.calls
            .rebuilt_as
            .lock()
            .unwrap()
            .push(file_type.name().to_string());
        Ok(self.script.outcome.clone())
    }

    fn error_message(&self) -> Result<Option<String>> {
        Ok(self.script.outcome.error_message().map(str::to_string))
    }

    fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.calls.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub bytes: Bytes,
}

pub struct MockTransfer {
    pub download: std::result::Result<Bytes, String>,
    pub upload: std::result::Result<String, String>,
    pub downloads: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<Upload>>,
}

impl MockTransfer {
    pub fn new() -> Arc<Self> {
        Self::with(Ok(Bytes::from_static(b"IN")), Ok("\"Test\"".to_string()))
    }

    pub fn with(
        download: std::result::Result<Bytes, String>,
        upload: std::result::Result<String, String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            download,
            upload,
            downloads: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl FileTransfer for MockTransfer {
    async fn download_file(&self, url: &str) -> Result<Bytes> {
        self.downloads.lock().unwrap().push(url.to_string());
        self.download.clone().map_err(RebuildError::Transport)
    }

    async fn upload_file(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        bytes: Bytes,
    ) -> Result<String> {
        self.uploads.lock().unwrap().push(Upload {
            url: url.to_string(),
            headers: headers.clone(),
            bytes,
        });
        self.upload.clone().map_err(RebuildError::Transport)
    }
}

/// `multipart/form-data` body with the given `(field, file name, data)` parts.
pub fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match file_name {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\nContent-Type: application/pdf\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}
