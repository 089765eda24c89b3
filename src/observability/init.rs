//! Tracing initialization and subscriber setup.

use super::file_writer::RotatingFile;
use crate::infrastructure::{ensure_parent, expand_tilde};
use crate::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// Sets up a subscriber pipeline that:
/// 1. Filters events with `RUST_LOG` if set, otherwise `config.trace_level`
/// 2. Formats them with `tracing-subscriber`'s `fmt` layer
/// 3. Writes to stderr, or to a rotated file when `config.log_file` is set
///
/// # Initialization Behavior
///
/// - Creates the log file's directory if it doesn't exist
/// - Falls back to stderr if that fails (logging is never fatal)
/// - Idempotent: only the first call installs a subscriber
///
/// # Example
///
/// ```rust
/// use unsplash_grid::observability::init_tracing;
/// use unsplash_grid::Config;
///
/// let config = Config {
///     trace_level: "debug".to_string(),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
/// init_tracing(&config);
///
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.trace_level));

    let log_file = config.log_file.as_deref().map(expand_tilde).and_then(|path| {
        match ensure_parent(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                eprintln!("cannot create log directory for {}: {e}", path.display());
                None
            }
        }
    });

    let installed = match log_file {
        Some(path) => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(RotatingFile::new(path)),
            )
            .try_init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(level = %config.trace_level, "tracing initialized");
    }
}
