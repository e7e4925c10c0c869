#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use rebuild_core::engine::{EngineOutcome, FileType, ProtectedOutput, UNKNOWN_FILE_TYPE};
use rebuild_core::metric::format_elapsed;
use rebuild_core::outcome::{classify_failure, FailureClass, RebuildOutcome};
use rebuild_core::{ErrorClass, RebuildError};

#[test]
fn protected_bytes_present_iff_success() {
    let ok = RebuildOutcome::from_output(
        ProtectedOutput {
            outcome_code: 1,
            protected: Some(b"OUT".to_vec()),
        },
        || panic!("error text must not be read on success"),
    );
    assert!(ok.is_success());
    assert_eq!(ok.protected(), Some(&b"OUT"[..]));
    assert_eq!(ok.protected_len(), 3);
    assert!(ok.error_message().is_none());

    let failed = RebuildOutcome::from_output(
        ProtectedOutput {
            outcome_code: 0,
            protected: None,
        },
        || Some("boom".into()),
    );
    assert!(!failed.is_success());
    assert!(failed.protected().is_none());
    assert_eq!(failed.protected_len(), 0);
    assert_eq!(failed.outcome_name(), "Error");
    assert_eq!(failed.error_message(), Some("boom"));
}

#[test]
fn failure_cannot_claim_success() {
    let o = RebuildOutcome::failure(EngineOutcome::Success, None);
    assert!(!o.is_success());
    assert!(o.protected().is_none());
}

#[test]
fn outcome_names() {
    assert_eq!(EngineOutcome::from_code(1).name(), "Success");
    assert_eq!(EngineOutcome::from_code(0).name(), "Error");
    assert_eq!(EngineOutcome::from_code(7).name(), "Unrecognised(7)");
    assert_eq!(EngineOutcome::from_code(7).code(), 7);
}

#[test]
fn disallow_is_classified_case_insensitively() {
    assert_eq!(
        classify_failure(Some("embedded potatoes were disallowed")),
        FailureClass::Disallowed
    );
    assert_eq!(classify_failure(Some("Macros DISALLOWED by policy")), FailureClass::Disallowed);
    assert_eq!(classify_failure(Some("corrupt structure")), FailureClass::Unprocessable);
    assert_eq!(classify_failure(None), FailureClass::Unprocessable);
    assert_eq!(FailureClass::Disallowed.http_status(), 200);
    assert_eq!(FailureClass::Unprocessable.http_status(), 422);
}

#[test]
fn file_type_codes_round_trip_and_unknown_is_sentinel() {
    for code in [16, 17, 18, 23, 39] {
        assert_eq!(FileType::from_code(code).code(), code);
    }
    assert_eq!(FileType::from_code(16).name(), "Pdf");
    assert_eq!(FileType::from_code(0).name(), UNKNOWN_FILE_TYPE);
    assert_eq!(FileType::from_code(12345), FileType::Unknown);
}

#[test]
fn error_classes_map_to_statuses() {
    let cases = [
        (RebuildError::ArgumentNull { argument: "buffer" }, 400),
        (RebuildError::Transport("Not Found".into()), 400),
        (RebuildError::EngineLoad("x".into()), 500),
        (RebuildError::UnsupportedFileType, 422),
        (
            RebuildError::EngineConfiguration {
                outcome: "Error".into(),
                error: "bad".into(),
            },
            500,
        ),
        (
            RebuildError::EngineConfiguration {
                outcome: "Error".into(),
                error: "Macros are disallowed".into(),
            },
            500,
        ),
        (
            RebuildError::EngineOutcomeFailure {
                outcome: "Error".into(),
                error: "bad".into(),
            },
            422,
        ),
        (RebuildError::Disposed, 500),
        (RebuildError::Unexpected("x".into()), 500),
    ];
    for (err, status) in cases {
        assert_eq!(err.class().http_status(), status, "{err}");
    }
    assert_eq!(RebuildError::Transport("Not Found".into()).to_string(), "Not Found");
    assert_eq!(ErrorClass::EngineFailure.as_str(), "ENGINE_FAILURE");
    assert_eq!(ErrorClass::EngineConfiguration.as_str(), "ENGINE_CONFIGURATION");
}

#[test]
fn elapsed_is_rendered_in_ticks() {
    assert_eq!(format_elapsed(Duration::ZERO), "00:00:00.0000000");
    assert_eq!(format_elapsed(Duration::from_nanos(1_234_567_800)), "00:00:01.2345678");
    assert_eq!(
        format_elapsed(Duration::from_secs(3 * 3600 + 25 * 60 + 7) + Duration::from_micros(500)),
        "03:25:07.0005000"
    );
}
