#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::Write;
use std::time::Duration;

use rebuild_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
engine:
  library_pth: "/opt/glasswall/libglasswall.classic.so" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.class().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.listen, "0.0.0.0:8080");
    assert_eq!(cfg.gateway.max_body_bytes, 100 * 1024 * 1024);
    assert_eq!(cfg.transfer.timeout(), Duration::from_secs(60));
    assert!(!cfg.engine.library_path.as_os_str().is_empty());
}

#[test]
fn overrides_are_applied() {
    let cfg = config::load_from_str(
        r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
  max_body_bytes: 2048
engine:
  library_path: "/opt/glasswall/libglasswall.classic.so"
transfer:
  timeout_ms: 5000
"#,
    )
    .expect("must parse");

    assert_eq!(cfg.gateway.listen, "127.0.0.1:9000");
    assert_eq!(cfg.gateway.max_body_bytes, 2048);
    assert_eq!(
        cfg.engine.library_path.to_str(),
        Some("/opt/glasswall/libglasswall.classic.so")
    );
    assert_eq!(cfg.transfer.timeout(), Duration::from_secs(5));
}

#[test]
fn rejects_invalid_values() {
    for bad in [
        "version: 2\n",
        "version: 1\ngateway:\n  listen: \"not an addr\"\n",
        "version: 1\ngateway:\n  max_body_bytes: 10\n",
        "version: 1\nengine:\n  library_path: \"\"\n",
        "version: 1\ntransfer:\n  timeout_ms: 1\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.class().as_str(), "CONFIG", "{bad}");
        assert_eq!(err.class().http_status(), 500);
    }
}

#[test]
fn load_from_file_reads_and_reports_missing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "version: 1\ntransfer:\n  timeout_ms: 2000").unwrap();

    let cfg = config::load_from_file(file.path()).expect("must load");
    assert_eq!(cfg.transfer.timeout_ms, 2000);

    let dir = tempfile::tempdir().unwrap();
    let err = config::load_from_file(dir.path().join("missing.yaml")).expect_err("must fail");
    assert!(err.to_string().contains("missing.yaml"));
}
