use rootscope_core::logging::init_logging;
use tempfile::tempdir;

#[test]
fn test_init_logging_installs_once() {
    let dir = tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    let guard = init_logging(&log_dir, "scan", false).unwrap();
    tracing::info!("scan started");
    assert!(log_dir.is_dir());

    // A second global subscriber is refused
    assert!(init_logging(&log_dir, "scan", false).is_err());
    drop(guard);
}
