//! Tests for `src/logging.rs`.

use smarttask::logging::LoggingGuard;

#[test]
fn logging_guard_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LoggingGuard>();
}

#[test]
fn init_production_creates_logs_dir_and_rejects_reinit() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let logs_dir = tmp.path().join("logs");
    assert!(!logs_dir.exists());

    let guard = smarttask::logging::init_production(&logs_dir, "debug");
    assert!(logs_dir.exists(), "logs directory should be created");
    assert!(guard.is_ok(), "first initialisation should succeed");

    tracing::info!(check = "logging", "written to the json log");

    assert!(
        smarttask::logging::init_cli("info").is_err(),
        "a second global subscriber must be refused"
    );
}
