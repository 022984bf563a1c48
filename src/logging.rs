//! Tracing initialisation for the binary.
//!
//! Logs go to stderr; with file logging enabled they are also appended,
//! non-blocking, to `log_path()`. `RUST_LOG` overrides the default level.

use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialise the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the program. Only the first call takes effect.
pub fn init_logging(level: Level, log_file: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr)
            .try_init()
            .ok();
        return None;
    };

    let directory = path.parent().unwrap_or(Path::new("."));
    if let Err(e) = std::fs::create_dir_all(directory) {
        eprintln!("Failed to create log directory {}: {}", directory.display(), e);
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "version-matrix.log".into());

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()
        .ok();

    Some(guard)
}
