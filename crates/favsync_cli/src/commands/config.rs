//! Config command implementation.

use crate::settings::{FallbackSetting, Settings};
use favsync_store::DataDir;

/// Changes requested by `config set`.
#[derive(Debug, Default)]
pub struct SettingsUpdate {
    /// New backend URL.
    pub server_url: Option<String>,
    /// New user id.
    pub user_id: Option<String>,
    /// New HTTP timeout.
    pub timeout_secs: Option<u64>,
    /// New periodic interval.
    pub interval_hours: Option<u32>,
    /// New network constraint.
    pub only_wifi: Option<bool>,
    /// Enable or disable periodic sync.
    pub enabled: Option<bool>,
    /// New cursor policy.
    pub cursor_fallback: Option<FallbackSetting>,
}

impl SettingsUpdate {
    /// Applies the update to `settings`.
    pub fn apply(self, settings: &mut Settings) {
        if let Some(url) = self.server_url {
            settings.server_url = Some(url);
        }
        if let Some(user) = self.user_id {
            settings.user_id = Some(user);
        }
        if let Some(timeout) = self.timeout_secs {
            settings.timeout_secs = timeout;
        }
        if let Some(hours) = self.interval_hours {
            settings.schedule.interval_hours = hours;
        }
        if let Some(only_wifi) = self.only_wifi {
            settings.schedule.only_wifi = only_wifi;
        }
        if let Some(enabled) = self.enabled {
            settings.schedule.enabled = enabled;
        }
        if let Some(fallback) = self.cursor_fallback {
            settings.cursor_fallback = fallback;
        }
    }
}

/// Prints the stored settings as JSON.
pub fn show(dir: &DataDir) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(&dir.config_path())?;
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

/// Updates and saves the stored settings.
pub fn set(dir: &DataDir, update: SettingsUpdate) -> Result<(), Box<dyn std::error::Error>> {
    let path = dir.config_path();
    let mut settings = Settings::load(&path)?;
    update.apply(&mut settings);
    settings.scheduler_config().validate()?;
    settings.save(&path)?;
    println!("✓ Settings saved to {}", path.display());
    Ok(())
}
