//! Logging setup
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt
//! layer on stderr (stdout is left to pipeline output). The filter comes
//! from an explicit directive if one is given, else from a valid `RUST_LOG`,
//! else from the configured directive. With `log_file` set, events
//! are also written to that file through a non-blocking `tracing-appender`
//! writer; keep the returned guard alive until exit so buffered lines are
//! flushed.

use crate::config::LoggingSettings;
use crate::error::{DaqflowError, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Fails if one is already installed.
///
/// `explicit` (typically a command-line flag) overrides both `RUST_LOG` and
/// `settings.filter`.
pub fn init_logging(
    settings: &LoggingSettings,
    explicit: Option<&str>,
) -> Result<Option<WorkerGuard>> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = select_filter(explicit, env.as_deref(), &settings.filter)?;

    let (file_layer, guard) = match &settings.log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(settings.ansi)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| DaqflowError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

/// Parse a filter directive such as `"info,daqflow::pipeline=debug"`.
pub fn directive_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive)
        .map_err(|e| DaqflowError::Config(format!("Invalid log filter `{}`: {}", directive, e)))
}

/// An explicit directive must be valid. An unparsable `RUST_LOG` is skipped.
fn select_filter(explicit: Option<&str>, env: Option<&str>, configured: &str) -> Result<EnvFilter> {
    if let Some(directive) = explicit {
        return directive_filter(directive);
    }
    match env.and_then(|directive| EnvFilter::try_new(directive).ok()) {
        Some(filter) => Ok(filter),
        None => directive_filter(configured),
    }
}

fn file_writer(path: &Path) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let file_name = path.file_name().ok_or_else(|| {
        DaqflowError::Config(format!("Log file path {:?} has no file name", path))
    })?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    std::fs::create_dir_all(dir).map_err(|e| {
        DaqflowError::Config(format!("Failed to create log directory {:?}: {}", dir, e))
    })?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn test_directive_filter() {
        assert!(directive_filter("info,daqflow::pipeline=debug").is_ok());
        assert!(directive_filter("daqflow=notalevel").is_err());
    }

    #[test]
    fn test_explicit_directive_wins() {
        let filter = select_filter(Some("warn"), Some("trace"), "info").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_env_directive_over_configured() {
        let filter = select_filter(None, Some("debug"), "info").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = select_filter(None, Some("daqflow=notalevel"), "error").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::ERROR));

        let filter = select_filter(None, None, "info").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_invalid_explicit_directive_rejected() {
        assert!(select_filter(Some("daqflow=notalevel"), Some("debug"), "info").is_err());
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("daqflow.log");
        let (_writer, _guard) = file_writer(&path).unwrap();
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn test_file_writer_needs_file_name() {
        assert!(file_writer(Path::new("/")).is_err());
    }
}
