use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging. In debug builds the default level is `debug` while in
/// release builds it falls back to `info`. The level can be overridden via the
/// `RUST_LOG` environment variable when `debug` is set.
///
/// With `log_file`, output goes to that file instead of stderr. Returns
/// `false` when a global subscriber was already installed.
pub fn init(debug: bool, log_file: Option<PathBuf>) -> bool {
    let debug = debug || cfg!(debug_assertions);
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = match log_file.as_deref().and_then(split_log_path) {
        Some((dir, file_name)) => {
            let appender = tracing_appender::rolling::never(dir, file_name);
            builder
                .with_ansi(false)
                .with_writer(appender)
                .try_init()
                .is_ok()
        }
        None => builder.try_init().is_ok(),
    };
    if installed {
        tracing::debug!(level, "logging initialised");
    }
    installed
}

fn split_log_path(path: &std::path::Path) -> Option<(PathBuf, std::ffi::OsString)> {
    let file_name = path.file_name()?.to_os_string();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((dir, file_name))
}
