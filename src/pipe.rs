use crate::cli::PipeArgs;
use diaglog::config::Config;
use diaglog::{DebugLogger, ExportOutcome, FileBridge, FlushOutcome, LogContext, LogLevel, Pipeline};
use std::future::Future;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{info, warn};

pub async fn run(args: PipeArgs) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_path(path.clone())?,
        None => Config::load()?,
    };
    if let Some(dir) = args.dir {
        config.host.log_dir = dir;
    }

    let bridge = FileBridge::open(&config.host)?;
    info!(
        log = %bridge.log_path().display(),
        export = %bridge.export_path().display(),
        "Piping stdin into diaglog"
    );

    let pipeline = Pipeline::from_config(&config, Arc::new(bridge));
    let logger = pipeline.debug_logger();

    let lines = BufReader::new(tokio::io::stdin()).lines();
    let count = forward_lines(lines, &logger, &args.component, shutdown_signal()).await?;
    info!(lines = count, "Input finished");

    finish(&pipeline, args.export).await;
    Ok(())
}

/// Record every non-blank line until EOF or `shutdown` resolves
async fn forward_lines<R, S>(
    mut lines: Lines<R>,
    logger: &DebugLogger,
    component: &str,
    shutdown: S,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut count = 0usize;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    record_line(logger, component, &line);
                    count += 1;
                }
                None => break,
            },
        }
    }
    Ok(count)
}

/// Export while the buffer still holds the session, then final flush
async fn finish(pipeline: &Pipeline, export: bool) -> (Option<ExportOutcome>, FlushOutcome) {
    let exported = if export {
        let outcome = pipeline.export_to_file().await;
        match &outcome {
            ExportOutcome::Exported { location, entries } => {
                info!(%location, entries, "Transcript written");
            }
            ExportOutcome::Unavailable => warn!("Transcript skipped, host unavailable"),
            ExportOutcome::Failed { reason } => warn!(%reason, "Transcript failed"),
        }
        Some(outcome)
    } else {
        None
    };

    let flushed = pipeline.destroy().await;
    info!(?flushed, "Pipeline stopped");
    (exported, flushed)
}

/// `ERROR`, `WARN` and `DEBUG` prefixes pick the level; anything else is INFO
fn parse_line(line: &str) -> (LogLevel, &str) {
    for (prefix, level) in [
        ("ERROR", LogLevel::Error),
        ("WARN", LogLevel::Warn),
        ("DEBUG", LogLevel::Debug),
    ] {
        let Some(rest) = line.strip_prefix(prefix) else {
            continue;
        };
        // The tag must end at a delimiter, so `WARNING` or `ERRORS` stay INFO
        if rest.is_empty() || rest.starts_with([':', ' ', '\t']) {
            return (level, rest.trim_start_matches([':', ' ', '\t']));
        }
    }
    (LogLevel::Info, line)
}

fn record_line(logger: &DebugLogger, component: &str, line: &str) {
    let (level, message) = parse_line(line);
    let ctx = LogContext::new(component).feature("pipe");
    match level {
        LogLevel::Debug => logger.debug(message, ctx),
        LogLevel::Info => logger.info(message, ctx),
        LogLevel::Warn => logger.warn(message, ctx),
        LogLevel::Error => logger.error(message, None, ctx),
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
