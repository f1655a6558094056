use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "./logs/podsync.log";

/// Install the global subscriber: coloured, timestamp-free lines on stdout
/// plus a plain copy in the log file.
///
/// `TRACING_LEVEL` takes an `EnvFilter` directive (default `info`, e.g.
/// `podsync=debug` to see track details). `LOG_FILE_PATH` sets the log
/// file, default `./logs/podsync.log`. Keep the returned guard alive until
/// exit; dropping it flushes the file writer.
pub fn init_logger() -> impl Drop {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path =
        env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let (log_dir, log_name) = split_log_path(&log_file_path);

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_file(false)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .with(filter_layer)
        .init();

    debug!("Logging to stdout and {}", log_dir.join(&log_name).display());

    guard
}

/// The appender takes a directory and a file name separately.
fn split_log_path(path: &str) -> (PathBuf, OsString) {
    let path = Path::new(path);
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| OsString::from("podsync.log"));
    (dir, name)
}
