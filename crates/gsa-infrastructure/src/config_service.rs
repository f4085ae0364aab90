//! File-backed configuration service.
//!
//! Loads and saves `config.toml` (~/.config/github-security-alerts/config.toml).
//! One service backs the selection, token and refresh interval stores so
//! every write is a read-modify-write of the same file.

use std::path::PathBuf;

use async_trait::async_trait;
use gsa_core::auth::TokenStore;
use gsa_core::config::AppConfig;
use gsa_core::error::{GsaError, Result};
use gsa_core::refresh::{
    DEFAULT_REFRESH_INTERVAL_MINUTES, RefreshIntervalStore, parse_refresh_interval,
};
use gsa_core::selection::SelectionStore;
use toml::{Table, Value};

use crate::paths::GsaPaths;
use crate::storage::AtomicTomlFile;

const TOKEN_KEY: &str = "access_token";
const SELECTED_KEY: &str = "selected_repos";
const INTERVAL_KEY: &str = "refresh_interval_minutes";

/// Configuration service over the application's TOML file.
#[derive(Debug, Clone)]
pub struct FileConfigService {
    file: AtomicTomlFile,
}

impl FileConfigService {
    /// Creates a service for the default config location.
    pub fn new() -> Result<Self> {
        Self::with_paths(&GsaPaths::default())
    }

    pub fn with_paths(paths: &GsaPaths) -> Result<Self> {
        let path = paths
            .config_file()
            .map_err(|e| GsaError::io(e.to_string()))?;
        Ok(Self::at(path))
    }

    /// Creates a service for an explicit file path.
    pub fn at(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    /// Loads the whole configuration.
    ///
    /// Never fails: an unreadable file or unusable field falls back to
    /// [`AppConfig::default`] values with a warning. The interval is read
    /// separately through [`RefreshIntervalStore`] so its parse error is
    /// reported rather than swallowed.
    pub async fn load_config(&self) -> AppConfig {
        let table = match self.read_table().await {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("Failed to read config file, using defaults: {}", e);
                return AppConfig::default();
            }
        };
        config_from_table(table)
    }

    async fn read_table(&self) -> Result<Table> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| GsaError::internal(format!("config read task failed: {}", e)))?
    }

    /// Writes one key (or removes it when `value` is `None`), keeping the rest.
    async fn write_key(&self, key: &'static str, value: Option<Value>) -> Result<()> {
        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            file.update(|table| {
                match value {
                    Some(value) => {
                        table.insert(key.to_string(), value);
                    }
                    None => {
                        table.remove(key);
                    }
                }
                Ok(())
            })
        })
        .await
        .map_err(|e| GsaError::internal(format!("config write task failed: {}", e)))?
        .map_err(|e| GsaError::persistence(format!("Failed to save {}: {}", key, e)))
    }
}

/// Interprets a raw table as an [`AppConfig`], ignoring the interval key's
/// shape and falling back to defaults for anything unusable.
fn config_from_table(mut table: Table) -> AppConfig {
    let interval =
        parse_refresh_interval(table.get(INTERVAL_KEY)).unwrap_or(DEFAULT_REFRESH_INTERVAL_MINUTES);
    table.remove(INTERVAL_KEY);

    let mut config = match Value::Table(table).try_into::<AppConfig>() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Config file has unexpected contents, using defaults: {}", e);
            AppConfig::default()
        }
    };
    config.refresh_interval_minutes = interval;
    config
}

#[async_trait]
impl SelectionStore for FileConfigService {
    async fn get_selected_repos(&self) -> Result<Vec<String>> {
        Ok(self.load_config().await.selected_repos)
    }

    async fn set_selected_repos(&self, full_names: Vec<String>) -> Result<()> {
        tracing::debug!("Saving {} selected repositories", full_names.len());
        let value = Value::Array(full_names.into_iter().map(Value::String).collect());
        self.write_key(SELECTED_KEY, Some(value)).await
    }
}

#[async_trait]
impl TokenStore for FileConfigService {
    async fn load_token(&self) -> Result<Option<String>> {
        Ok(self.load_config().await.access_token)
    }

    async fn save_token(&self, token: Option<String>) -> Result<()> {
        self.write_key(TOKEN_KEY, token.map(Value::String)).await
    }
}

#[async_trait]
impl RefreshIntervalStore for FileConfigService {
    async fn get_refresh_interval(&self) -> Result<u32> {
        let table = self.read_table().await?;
        parse_refresh_interval(table.get(INTERVAL_KEY))
    }

    async fn set_refresh_interval(&self, minutes: u32) -> Result<()> {
        self.write_key(INTERVAL_KEY, Some(Value::Integer(i64::from(minutes))))
            .await
    }
}
