use std::path::Path;

use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILE_NAME: &str = "tgetl.log";

/// Installs the process subscriber: an append-only file under `log_dir` plus
/// stdout. Without a writable `log_dir` only stdout is used.
pub fn init_tracing(log_dir: &Path) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let file_layer = std::fs::create_dir_all(log_dir).ok().map(|_| {
        fmt::layer()
            .with_target(false)
            .with_ansi(false)
            .with_writer(rolling::never(log_dir, LOG_FILE_NAME))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}
