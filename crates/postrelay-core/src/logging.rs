//! Logging initialization for the relay service.
//!
//! Thin wrapper over the observability crate: JSONL to
//! `~/.postrelay/logs/postrelay.jsonl` plus a compact stderr copy.

use crate::{CoreResult, Paths};

const SERVICE_NAME: &str = "postrelay";

/// Initialize the logging system.
///
/// `level` is the default filter (trace, debug, info, warn, error);
/// `RUST_LOG` still takes precedence when set.
///
/// ```ignore
/// init_logging(&paths, "info")?;
/// tracing::info!("gateway started");
/// ```
pub fn init_logging(paths: &Paths, level: &str) -> CoreResult<()> {
    paths.ensure_dirs()?;

    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.to_ascii_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        init_logging(&paths, "INFO").unwrap();
        assert!(paths.log_file().exists());
    }
}
