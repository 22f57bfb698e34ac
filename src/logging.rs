//! Tracing setup. The terminal belongs to the UI, so logs go to a file.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::DirError;

const DEFAULT_FILTER: &str = "peopledir=info,pd=info";

/// Installs the global subscriber writing to `log_file`. `RUST_LOG` overrides the
/// default filter. Without a log file, nothing is installed and events are dropped.
pub fn init_logging(log_file: Option<&Path>) -> Result<(), DirError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(ErrorLayer::default());

    // Already set, e.g. by a test harness.
    let _ = subscriber.try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_log_file_is_fine() {
        assert!(init_logging(None).is_ok());
    }

    #[test]
    fn creates_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pd.log");
        init_logging(Some(&path)).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn unwritable_location_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("pd.log");
        assert!(matches!(init_logging(Some(&path)), Err(DirError::IoError(_))));
    }
}
