use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the stdout subscriber, plus a daily-rolling file layer when
/// `ENABLE_FILE_LOGS` is set. The returned guard keeps the file writer
/// flushing and must be held for the life of the process.
pub fn init_tracing(log_level: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match file_writer() {
        Some((writer, guard)) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true)),
            Some(guard),
        ),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    guard
}

fn file_writer() -> Option<(NonBlocking, WorkerGuard)> {
    let enabled = matches!(
        std::env::var("ENABLE_FILE_LOGS").as_deref(),
        Ok("1") | Ok("true")
    );
    if !enabled {
        return None;
    }

    let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    if let Err(err) = std::fs::create_dir_all(&dir) {
        eprintln!("failed to create log directory {dir}: {err}");
        return None;
    }

    Some(tracing_appender::non_blocking(rolling::daily(dir, "vocab.log")))
}
