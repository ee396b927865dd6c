use std::fs::{self, OpenOptions};
use std::sync::Arc;

use tracing::{warn, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use crate::error::{CoreError, Result};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "logs/logfile.json";

/// Install the global JSON subscriber, writing to stdout and to
/// `logs/logfile.json` (created on first use, appended thereafter).
///
/// `RUST_LOG` takes precedence when set; otherwise `log_level` is parsed as a
/// plain severity name. An unset or unrecognised value falls back to `trace`
/// and a warning is emitted once the subscriber is live.
pub fn init(log_level: Option<&str>) -> Result<()> {
    fs::create_dir_all(LOG_DIR)?;
    let file = OpenOptions::new().create(true).append(true).open(LOG_FILE)?;

    let mut fell_back = false;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let (level, unrecognised) = resolve_level(log_level);
            fell_back = unrecognised;
            EnvFilter::new(level.to_string())
        }
    };

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stdout.and(Arc::new(file)))
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    if fell_back {
        warn!(
            log_level = log_level.unwrap_or("<unset>"),
            "LOG_LEVEL missing or unrecognised, defaulting to trace"
        );
    }
    Ok(())
}

/// Map a LOG_LEVEL value to a tracing level, reporting whether the trace
/// fallback was taken.
fn resolve_level(value: Option<&str>) -> (Level, bool) {
    match value {
        Some(s) => match s.parse::<Level>() {
            Ok(level) => (level, false),
            Err(_) => (Level::TRACE, true),
        },
        None => (Level::TRACE, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_severity_names_parse() {
        assert_eq!(resolve_level(Some("info")), (Level::INFO, false));
        assert_eq!(resolve_level(Some("WARN")), (Level::WARN, false));
        assert_eq!(resolve_level(Some("error")), (Level::ERROR, false));
        assert_eq!(resolve_level(Some("debug")), (Level::DEBUG, false));
    }

    #[test]
    fn unrecognised_level_falls_back_to_trace() {
        assert_eq!(resolve_level(Some("verbose")), (Level::TRACE, true));
        assert_eq!(resolve_level(Some("")), (Level::TRACE, true));
    }

    #[test]
    fn unset_level_falls_back_to_trace() {
        assert_eq!(resolve_level(None), (Level::TRACE, true));
    }

    #[test]
    fn double_init_is_a_logging_error() {
        // Jail confines the logs/ directory to a scratch cwd.
        figment::Jail::expect_with(|_jail| {
            assert!(init(Some("debug")).is_ok());
            assert!(std::path::Path::new(LOG_FILE).exists());
            let err = init(Some("debug")).unwrap_err();
            assert!(matches!(err, CoreError::Logging(_)));
            Ok(())
        });
    }
}
