//! Rebuild outcome and failure classification.

use crate::engine::{EngineOutcome, ProtectedOutput};

/// Result of one rebuild attempt.
///
/// `protected` is present iff `outcome` is Success; the constructors are the
/// only way to build one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildOutcome {
    outcome: EngineOutcome,
    protected: Option<Vec<u8>>,
    error_message: Option<String>,
}

impl RebuildOutcome {
    pub fn success(protected: Vec<u8>) -> Self {
        Self {
            outcome: EngineOutcome::Success,
            protected: Some(protected),
            error_message: None,
        }
    }

    /// A non-success outcome. A `Success` code passed here is kept as
    /// `Unrecognised` so the invariant cannot be broken by a caller.
    pub fn failure(outcome: EngineOutcome, error_message: Option<String>) -> Self {
        let outcome = match outcome {
            EngineOutcome::Success => EngineOutcome::Other(EngineOutcome::Success.code()),
            other => other,
        };
        Self {
            outcome,
            protected: None,
            error_message,
        }
    }

    /// Lift the binding output. `error_message` is only consulted on failure.
    pub fn from_output(output: ProtectedOutput, error_message: impl FnOnce() -> Option<String>) -> Self {
        let outcome = EngineOutcome::from_code(output.outcome_code);
        match (outcome, output.protected) {
            (EngineOutcome::Success, Some(bytes)) => Self::success(bytes),
            (EngineOutcome::Success, None) => Self::success(Vec::new()),
            (other, _) => Self::failure(other, error_message()),
        }
    }

    pub fn outcome(&self) -> EngineOutcome {
        self.outcome
    }

    pub fn outcome_name(&self) -> String {
        self.outcome.name()
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn protected(&self) -> Option<&[u8]> {
        self.protected.as_deref()
    }

    pub fn into_protected(self) -> Option<Vec<u8>> {
        self.protected
    }

    /// Output length, 0 when there is no output.
    pub fn protected_len(&self) -> usize {
        self.protected.as_ref().map_or(0, Vec::len)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// How a non-success engine result is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Content rejected by policy. Answered 200.
    Disallowed,
    /// Any other engine failure. Answered 422.
    Unprocessable,
}

impl FailureClass {
    pub fn http_status(self) -> u16 {
        match self {
            FailureClass::Disallowed => 200,
            FailureClass::Unprocessable => 422,
        }
    }
}

/// `Disallowed` iff the engine's error text contains "disallow" (any case).
pub fn classify_failure(error_text: Option<&str>) -> FailureClass {
    match error_text {
        Some(text) if text.to_lowercase().contains("disallow") => FailureClass::Disallowed,
        _ => FailureClass::Unprocessable,
    }
}
