//! Engine sessions: the workflow-facing service over [`EngineBinding`].
//!
//! Workflows never touch the binding directly. They receive an
//! [`EngineFactory`] at construction and open one [`EngineSession`] per
//! request, which they dispose on every exit path.

use std::path::PathBuf;

use rebuild_core::engine::{EngineBinding, EngineOutcome, FileType};
use rebuild_core::error::{RebuildError, Result};
use rebuild_core::outcome::RebuildOutcome;
use rebuild_core::policy::ContentManagementPolicy;

/// Version reported when the engine cannot produce one.
pub const VERSION_UNAVAILABLE: &str = "Error Retrieving";

/// One request's view of the engine.
pub trait EngineSession: Send {
    /// Engine version, or [`VERSION_UNAVAILABLE`].
    fn library_version(&self) -> String;

    /// Detected type of `bytes`. Detection failures degrade to [`FileType::Unknown`].
    fn file_type(&self, bytes: &[u8]) -> FileType;

    /// Push `policy`; a non-success outcome is an [`RebuildError::EngineConfiguration`].
    fn set_configuration(&self, policy: &ContentManagementPolicy) -> Result<()>;

    fn rebuild(&self, bytes: &[u8], file_type: FileType) -> Result<RebuildOutcome>;

    fn error_message(&self) -> Result<Option<String>>;

    /// Release the engine. Idempotent.
    fn dispose(&mut self);
}

/// Opens engine sessions. Injected into workflows.
pub trait EngineFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn EngineSession>>;
}

/// Opens the engine library at a fixed path for every session.
#[derive(Debug, Clone)]
pub struct LibraryEngineFactory {
    library_path: PathBuf,
}

impl LibraryEngineFactory {
    pub fn new(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
        }
    }
}

impl EngineFactory for LibraryEngineFactory {
    fn create(&self) -> Result<Box<dyn EngineSession>> {
        let binding = EngineBinding::load(&self.library_path)?;
        Ok(Box::new(GlasswallSession::new(binding)))
    }
}

/// [`EngineSession`] backed by the native engine.
#[derive(Debug)]
pub struct GlasswallSession {
    binding: EngineBinding,
}

impl GlasswallSession {
    pub fn new(binding: EngineBinding) -> Self {
        Self { binding }
    }

    fn last_error(&self) -> String {
        match self.binding.query_last_error() {
            Ok(Some(msg)) => msg,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read engine error message");
                String::new()
            }
        }
    }
}

impl EngineSession for GlasswallSession {
    fn library_version(&self) -> String {
        match self.binding.query_version() {
            Ok(Some(version)) => version,
            Ok(None) => VERSION_UNAVAILABLE.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read engine version");
                VERSION_UNAVAILABLE.to_string()
            }
        }
    }

    fn file_type(&self, bytes: &[u8]) -> FileType {
        match self.binding.detect_file_type(bytes) {
            Ok(code) => {
                let file_type = FileType::from_code(code);
                tracing::debug!(code, file_type = file_type.name(), "file type detected");
                file_type
            }
            Err(e) => {
                tracing::warn!(error = %e, "file type detection failed, defaulting to Unknown");
                FileType::Unknown
            }
        }
    }

    fn set_configuration(&self, policy: &ContentManagementPolicy) -> Result<()> {
        let xml = policy.serialize()?;
        let outcome = EngineOutcome::from_code(self.binding.push_config(&xml)?);

        if !outcome.is_success() {
            let error = self.last_error();
            tracing::warn!(outcome = %outcome.name(), %error, "engine rejected configuration");
            return Err(RebuildError::EngineConfiguration {
                outcome: outcome.name(),
                error,
            });
        }

        tracing::debug!("engine configuration set");
        Ok(())
    }

    fn rebuild(&self, bytes: &[u8], file_type: FileType) -> Result<RebuildOutcome> {
        let output = self.binding.rebuild(bytes, file_type.name())?;
        let outcome = RebuildOutcome::from_output(output, || Some(self.last_error()));

        match outcome.error_message() {
            None => tracing::debug!(len = outcome.protected_len(), "file rebuilt"),
            Some(error) => tracing::info!(outcome = %outcome.outcome_name(), %error, "unable to protect file"),
        }
        Ok(outcome)
    }

    fn error_message(&self) -> Result<Option<String>> {
        self.binding.query_last_error()
    }

    fn dispose(&mut self) {
        self.binding.dispose();
    }
}
