//! Logging Infrastructure
//!
//! Structured logging setup. `RUST_LOG` wins over the configured level when set,
//! so individual targets (e.g. `security`, `store_server::availability`) can be tuned at runtime.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger with optional daily-rolling file output
///
/// File output is only enabled when `log_dir` already exists; otherwise logs go
/// to stdout. Calling this twice is harmless (the second call is ignored).
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "store-server");
            let _ = subscriber.with_writer(file_appender).with_ansi(false).try_init();
            return;
        }
        eprintln!("Log directory {dir} does not exist, logging to stdout");
    }

    let _ = subscriber.try_init();
}
