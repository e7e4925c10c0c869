//! Shared error type across rebuild crates.

use thiserror::Error;

/// Stable error classes (surfaced in logs and used for status mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Caller input missing or empty.
    BadArgument,
    /// Native library could not be loaded or bound.
    EngineLoad,
    /// Detected file type is not supported.
    UnsupportedFileType,
    /// Engine failed a rebuild.
    EngineFailure,
    /// Engine rejected the configuration payload.
    EngineConfiguration,
    /// Download / upload failed.
    Transport,
    /// Engine session used after dispose.
    Disposed,
    /// Invalid service configuration.
    Config,
    /// Anything else.
    Internal,
}

impl ErrorClass {
    /// String representation used in logs and JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::BadArgument => "BAD_ARGUMENT",
            ErrorClass::EngineLoad => "ENGINE_LOAD",
            ErrorClass::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            ErrorClass::EngineFailure => "ENGINE_FAILURE",
            ErrorClass::EngineConfiguration => "ENGINE_CONFIGURATION",
            ErrorClass::Transport => "TRANSPORT",
            ErrorClass::Disposed => "DISPOSED",
            ErrorClass::Config => "CONFIG",
            ErrorClass::Internal => "INTERNAL",
        }
    }

    /// HTTP status a workflow answers with when this class reaches its top-level catch.
    ///
    /// `EngineFailure` answers 422 here; the outcome classifier upgrades it to 200
    /// when the engine reported a policy disallow.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorClass::BadArgument | ErrorClass::Transport => 400,
            ErrorClass::UnsupportedFileType | ErrorClass::EngineFailure => 422,
            ErrorClass::EngineLoad
            | ErrorClass::EngineConfiguration
            | ErrorClass::Disposed
            | ErrorClass::Config
            | ErrorClass::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RebuildError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("argument must be defined: {argument}")]
    ArgumentNull { argument: &'static str },
    #[error("argument is invalid: {argument} message: {message}")]
    Argument {
        argument: &'static str,
        message: String,
    },
    #[error("engine load failed: {0}")]
    EngineLoad(String),
    #[error("File Type could not be determined to be a supported type")]
    UnsupportedFileType,
    #[error("could not set engine configuration, status: {outcome} error: {error}")]
    EngineConfiguration { outcome: String, error: String },
    #[error("engine failed, status: {outcome} error: {error}")]
    EngineOutcomeFailure { outcome: String, error: String },
    #[error("{0}")]
    Transport(String),
    #[error("engine binding used after dispose")]
    Disposed,
    #[error("config: {0}")]
    Config(String),
    #[error("unexpected: {0}")]
    Unexpected(String),
}

impl RebuildError {
    /// Map the error onto its stable class.
    pub fn class(&self) -> ErrorClass {
        match self {
            RebuildError::ArgumentNull { .. } | RebuildError::Argument { .. } => {
                ErrorClass::BadArgument
            }
            RebuildError::EngineLoad(_) => ErrorClass::EngineLoad,
            RebuildError::UnsupportedFileType => ErrorClass::UnsupportedFileType,
            RebuildError::EngineConfiguration { .. } => ErrorClass::EngineConfiguration,
            RebuildError::EngineOutcomeFailure { .. } => ErrorClass::EngineFailure,
            RebuildError::Transport(_) => ErrorClass::Transport,
            RebuildError::Disposed => ErrorClass::Disposed,
            RebuildError::Config(_) => ErrorClass::Config,
            RebuildError::Unexpected(_) => ErrorClass::Internal,
        }
    }

    /// Engine-reported error text for engine failures.
    pub fn engine_error(&self) -> Option<&str> {
        match self {
            RebuildError::EngineConfiguration { error, .. }
            | RebuildError::EngineOutcomeFailure { error, .. } => Some(error),
            _ => None,
        }
    }
}
