use std::fs;
use std::path::Path;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging to stderr plus, when `log_dir` is set, a JSON log file
/// rotated daily. `RUST_LOG` overrides `filter` when present. A log
/// directory that cannot be created leaves console logging only, with a
/// warning.
///
/// Keep the returned guard alive for as long as file logs should be flushed.
pub fn init_logging(filter: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("lvr_trend=info"));

    let mut dir_error = None;
    let (file_layer, guard) = match log_dir {
        Some(dir) => match fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(dir, "lvr_trend.log");
                let (writer, guard) = tracing_appender::non_blocking(file_appender);
                (Some(fmt::layer().json().with_writer(writer)), Some(guard))
            }
            Err(e) => {
                dir_error = Some((dir.to_path_buf(), e));
                (None, None)
            }
        },
        None => (None, None),
    };

    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    if let Some((dir, e)) = dir_error {
        warn!(dir = %dir.display(), error = %e, "log directory could not be created, logging to console only");
    }
    guard
}
