//! Path management for configuration and log files.

use std::path::PathBuf;

/// Directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "github-security-alerts";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Platform config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Path resolution, optionally rooted at an explicit base directory.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/github-security-alerts/
/// ├── config.toml        # token, selected repositories, refresh interval
/// └── logs/
///     └── gsa.log.YYYY-MM-DD
/// ```
#[derive(Debug, Clone, Default)]
pub struct GsaPaths {
    base: Option<PathBuf>,
}

impl GsaPaths {
    /// Creates a resolver. `None` uses the platform config directory.
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn log_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("logs"))
    }
}
