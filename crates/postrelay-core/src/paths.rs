//! File system paths for the relay service.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Environment variable that relocates the base directory.
pub const HOME_ENV_VAR: &str = "POSTRELAY_HOME";

/// Manages file system paths for the service.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for config, database and logs (~/.postrelay)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `$POSTRELAY_HOME`, or
    /// `~/.postrelay` when that is unset.
    pub fn new() -> CoreResult<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
            return Ok(Self::with_base_dir(PathBuf::from(dir)));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(".postrelay"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Config file path (~/.postrelay/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Post database path (~/.postrelay/posts.sqlite).
    pub fn database_file(&self) -> PathBuf {
        self.base_dir.join("posts.sqlite")
    }

    /// Logs directory (~/.postrelay/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// JSONL log file (~/.postrelay/logs/postrelay.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("postrelay.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_layout() {
        let paths = Paths::with_base_dir(PathBuf::from("/srv/postrelay"));
        assert_eq!(paths.base_dir(), &PathBuf::from("/srv/postrelay"));
        assert_eq!(paths.config_file(), PathBuf::from("/srv/postrelay/config.json"));
        assert_eq!(paths.database_file(), PathBuf::from("/srv/postrelay/posts.sqlite"));
        assert_eq!(
            paths.log_file(),
            PathBuf::from("/srv/postrelay/logs/postrelay.jsonl")
        );
    }

    #[test]
    fn test_ensure_dirs_creates_tree() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("nested").join("home"));

        paths.ensure_dirs().unwrap();
        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir().is_dir());

        // Idempotent
        paths.ensure_dirs().unwrap();
    }
}
