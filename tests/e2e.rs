// End-to-end: pipeline + file-backed host on a temp directory

use diaglog::config::Config;
use diaglog::{ExportOutcome, FileBridge, FlushOutcome, LogContext, LogEntry, Pipeline};
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_entries_land_in_host_log_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("diaglog.toml");
    let log_dir = temp_dir.path().join("logs");

    fs::write(
        &config_path,
        format!(
            "[buffer]\ncapacity = 100\nflush_threshold = 50\n\n[host]\nlog_dir = \"{}\"\n",
            log_dir.display()
        ),
    )
    .unwrap();

    let config = Config::load_from_path(config_path).unwrap();
    let bridge = FileBridge::open(&config.host).unwrap();
    let log_path = bridge.log_path().to_path_buf();
    let export_path = bridge.export_path().to_path_buf();

    let pipeline = Pipeline::from_config(&config, Arc::new(bridge));
    let logger = pipeline.debug_logger();
    let ui = pipeline.ui_logger();

    logger.info(
        "chapter saved",
        LogContext::new("Editor").feature("autosave").field("chapter", 4),
    );
    ui.click("Toolbar", "bold", None);

    assert_eq!(pipeline.flush().await, FlushOutcome::Delivered(2));

    let content = fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);

    let raw: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(raw["level"], "INFO");
    assert_eq!(raw["source"], "frontend");
    assert_eq!(raw["data"], json!({"chapter": 4}));
    assert!(raw.get("stack").is_none());

    let second: LogEntry = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second.action.as_deref(), Some("click"));
    assert_eq!(second.component, "Toolbar");

    logger.warn("about to export", "Shell");
    match pipeline.export_to_file().await {
        ExportOutcome::Exported { location, entries } => {
            assert_eq!(location, export_path.display().to_string());
            assert_eq!(entries, 1);
        }
        other => panic!("unexpected export outcome: {other:?}"),
    }
    let transcript = fs::read_to_string(&export_path).unwrap();
    assert!(transcript.contains("[WARN] [frontend] [N/A] [Shell] about to export"));

    pipeline.destroy().await;
    let content = fs::read_to_string(&log_path).unwrap();
    assert_eq!(content.lines().count(), 3);
}
