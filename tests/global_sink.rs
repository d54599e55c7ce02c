// The panic hook is process-wide, so everything runs in one test

use diaglog::bridge::MemoryBridge;
use diaglog::sink::{HANDLER_COMPONENT, REJECTION_FEATURE, UNCAUGHT_FEATURE};
use diaglog::{GlobalSink, LogLevel, Pipeline, PipelineSettings, SinkError};
use std::sync::Arc;

#[tokio::test]
async fn test_global_sink_lifecycle() {
    let bridge = Arc::new(MemoryBridge::available());
    let pipeline = Pipeline::start(PipelineSettings::default(), bridge);
    let logger = pipeline.debug_logger();

    let guard = GlobalSink::install(logger.clone()).unwrap();
    assert!(GlobalSink::is_installed());
    assert!(matches!(
        GlobalSink::install(logger.clone()),
        Err(SinkError::AlreadyInstalled)
    ));

    // Uncaught panic
    let result = std::panic::catch_unwind(|| panic!("kaboom"));
    assert!(result.is_err());

    let logs = pipeline.get_logs();
    let uncaught = logs
        .iter()
        .find(|e| e.feature.as_deref() == Some(UNCAUGHT_FEATURE))
        .expect("panic is captured");
    assert_eq!(uncaught.level, LogLevel::Error);
    assert_eq!(uncaught.component, HANDLER_COMPONENT);
    assert_eq!(uncaught.error.as_deref(), Some("kaboom"));
    assert!(uncaught.stack.as_deref().is_some_and(|s| s.contains("global_sink.rs")));

    // Fire-and-forget task that fails
    let handle = guard.spawn(async { Err::<(), _>(std::io::Error::other("connection lost")) });
    assert_eq!(handle.await.unwrap(), None);

    let ok = guard.spawn(async { Ok::<_, std::io::Error>(7) });
    assert_eq!(ok.await.unwrap(), Some(7));

    let logs = pipeline.get_logs();
    let rejections: Vec<_> = logs
        .iter()
        .filter(|e| e.feature.as_deref() == Some(REJECTION_FEATURE))
        .collect();
    assert_eq!(rejections.len(), 1);
    assert_eq!(rejections[0].error.as_deref(), Some("connection lost"));

    guard.uninstall();
    assert!(!GlobalSink::is_installed());

    // Panics after uninstall are no longer captured
    let before = pipeline.get_logs().len();
    let _ = std::panic::catch_unwind(|| panic!("ignored"));
    assert_eq!(pipeline.get_logs().len(), before);

    let guard = GlobalSink::install(logger).unwrap();
    drop(guard);
    assert!(!GlobalSink::is_installed());
}
