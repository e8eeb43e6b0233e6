use crate::notifications::DEFAULT_REMINDER_BODY;
use crate::persistence::{atomic_write, read_file};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User settings stored in config.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Permission for scheduling reminders
    pub notifications_enabled: bool,
    /// Show due reminders as desktop notifications (macOS)
    pub desktop_alerts: bool,
    pub default_reminder_hour: u32,
    pub default_reminder_minute: u32,
    pub reminder_body: String,
    /// How often the TUI checks for due reminders
    pub reminder_check_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            desktop_alerts: true,
            default_reminder_hour: 12,
            default_reminder_minute: 30,
            reminder_body: DEFAULT_REMINDER_BODY.to_string(),
            reminder_check_secs: 15,
        }
    }
}

impl AppConfig {
    /// Default reminder time, clamped to a valid time of day
    pub fn default_reminder_time(&self) -> (u32, u32) {
        (
            self.default_reminder_hour.min(23),
            self.default_reminder_minute.min(59),
        )
    }

    pub fn reminder_check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.reminder_check_secs.max(1))
    }
}

/// Load config from config.json, defaults when the file doesn't exist
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    let Some(content) = read_file(path)? else {
        return Ok(AppConfig::default());
    };

    serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Save config to config.json
pub fn save_config<P: AsRef<Path>>(path: P, config: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    atomic_write(path, &json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_load_nonexistent_config() {
        let temp_dir = tempdir().unwrap();
        let config = load_config(temp_dir.path().join("config.json")).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_reminder_time(), (12, 30));
        assert_eq!(config.reminder_body, "Time to complete your activity");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");

        let config = AppConfig {
            notifications_enabled: false,
            default_reminder_hour: 7,
            ..AppConfig::default()
        };
        save_config(&path, &config).unwrap();

        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, r#"{"desktop_alerts": false}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert!(!config.desktop_alerts);
        assert!(config.notifications_enabled);
        assert_eq!(config.reminder_check_secs, 15);
    }

    #[test]
    fn test_out_of_range_default_time_is_clamped() {
        let config = AppConfig {
            default_reminder_hour: 30,
            default_reminder_minute: 75,
            ..AppConfig::default()
        };
        assert_eq!(config.default_reminder_time(), (23, 59));
    }
}
