// In: src/logging.rs

//! Opt-in diagnostic output for the import path.
//!
//! The library only emits records through the `log` facade. Applications that
//! want to see them without wiring up their own logger can call
//! `enable_verbose_logging` once at startup.

use std::fs::{File, OpenOptions};
use std::sync::Once;

use log::LevelFilter;

use crate::error::InterchangeError;

static INIT_LOGGER: Once = Once::new();

/// Installs a global `env_logger` at `Debug` level that prints `[LEVEL] message`
/// lines to stderr, or appends them to `log_file` when one is given.
///
/// Only the first call does anything; later calls are no-ops and never touch
/// `log_file`. Fails only if that first call cannot open `log_file`, in which
/// case no logger is installed.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<(), InterchangeError> {
    let mut result = Ok(());

    INIT_LOGGER.call_once(|| {
        let file = match log_file.map(open_log_file).transpose() {
            Ok(file) => file,
            Err(e) => {
                result = Err(e);
                return;
            }
        };

        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    result
}

fn open_log_file(path: &str) -> Result<File, InterchangeError> {
    Ok(OpenOptions::new().append(true).create(true).open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unopenable_log_file_is_an_io_error() {
        let result = open_log_file("/nonexistent-dir/interchange.log");
        assert!(matches!(result, Err(InterchangeError::Io(_))));
    }

    #[test]
    fn test_repeated_initialization_is_harmless() {
        assert!(enable_verbose_logging(None).is_ok());
        assert!(enable_verbose_logging(None).is_ok());
        log::debug!("logger installed");
    }

    #[test]
    fn test_later_calls_do_not_open_the_log_file() {
        let _ = enable_verbose_logging(None);

        let path = std::env::temp_dir().join(format!("interchange-{}.log", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        assert!(enable_verbose_logging(Some(&path)).is_ok());
        assert!(!std::path::Path::new(&path).exists());
    }
}
