//! Client settings stored as `config.json` in the data directory.

use favsync_engine::{CursorFallback, EngineConfig, SchedulerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors reading or writing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid JSON.
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    /// A required setting has no value.
    #[error("{0} is not set; run `favsync config set --{1} <value>` or pass --{1}")]
    Missing(&'static str, &'static str),
}

/// Result type for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Periodic sync settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Hours between periodic runs.
    pub interval_hours: u32,
    /// Only sync on unmetered networks.
    pub only_wifi: bool,
    /// Whether `watch` registers periodic sync.
    pub enabled: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            interval_hours: 6,
            only_wifi: false,
            enabled: true,
        }
    }
}

/// Cursor policy as written in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackSetting {
    /// Use the device clock.
    #[default]
    DeviceClock,
    /// Keep the previous cursor.
    KeepPrevious,
}

/// Everything the CLI remembers between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend base URL.
    pub server_url: Option<String>,
    /// Signed-in user.
    pub user_id: Option<String>,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Cursor policy when the server omits its timestamp.
    pub cursor_fallback: FallbackSetting,
    /// Periodic sync.
    pub schedule: ScheduleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: None,
            user_id: None,
            timeout_secs: 30,
            cursor_fallback: FallbackSetting::default(),
            schedule: ScheduleSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        match fs::read(path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Self::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes settings to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> SettingsResult<()> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Returns the server URL or an error naming the missing setting.
    pub fn require_server_url(&self) -> SettingsResult<&str> {
        self.server_url
            .as_deref()
            .ok_or(SettingsError::Missing("server URL", "server-url"))
    }

    /// Returns the user id or an error naming the missing setting.
    pub fn require_user_id(&self) -> SettingsResult<&str> {
        self.user_id
            .as_deref()
            .ok_or(SettingsError::Missing("user id", "user"))
    }

    /// HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Engine configuration derived from these settings.
    pub fn engine_config(&self) -> EngineConfig {
        let fallback = match self.cursor_fallback {
            FallbackSetting::DeviceClock => CursorFallback::DeviceClock,
            FallbackSetting::KeepPrevious => CursorFallback::KeepPrevious,
        };
        EngineConfig::new().with_cursor_fallback(fallback)
    }

    /// Scheduler configuration derived from these settings.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(self.schedule.interval_hours, self.schedule.only_wifi)
            .with_enabled(self.schedule.enabled)
    }
}
