//! Refresh interval setting.

use async_trait::async_trait;

use crate::error::{GsaError, Result};

/// Alert polling interval used when none is stored or the stored value is
/// unusable.
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u32 = 60;

/// Cadence of the update check task. Not user-configurable.
pub const UPDATE_CHECK_INTERVAL_MINUTES: u32 = 60;

/// Intervals offered in the settings view. `0` disables polling.
pub const REFRESH_INTERVAL_CHOICES: [u32; 7] = [0, 5, 15, 30, 60, 120, 240];

/// Persisted refresh interval.
#[async_trait]
pub trait RefreshIntervalStore: Send + Sync {
    /// Returns the stored interval in minutes.
    ///
    /// A malformed stored value yields `GsaError::ConfigParse`; callers fall
    /// back to [`DEFAULT_REFRESH_INTERVAL_MINUTES`].
    async fn get_refresh_interval(&self) -> Result<u32>;

    async fn set_refresh_interval(&self, minutes: u32) -> Result<()>;
}

/// Reads an interval from a raw persisted value.
///
/// Accepts a non-negative integer or a string holding one. A missing value
/// is the default; anything else is a `ConfigParse` error.
pub fn parse_refresh_interval(raw: Option<&toml::Value>) -> Result<u32> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_REFRESH_INTERVAL_MINUTES);
    };

    match raw {
        toml::Value::Integer(n) => u32::try_from(*n).map_err(|_| {
            GsaError::config_parse(format!("refresh interval {} is out of range", n))
        }),
        toml::Value::String(s) => s.trim().parse::<u32>().map_err(|_| {
            GsaError::config_parse(format!("refresh interval '{}' is not a number", s))
        }),
        other => Err(GsaError::config_parse(format!(
            "refresh interval has unexpected type {}",
            other.type_str()
        ))),
    }
}
