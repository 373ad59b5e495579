//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Reminder switch, cooldown and activity grace period
//! - Per-activity cadence used to pick the reminder message
//! - Quiet hours
//!
//! Configuration is stored at `~/.config/calmnudge/config.toml`.

use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::reminder::{CadenceConfig, QuietHoursConfig, ReminderSettings, DEFAULT_COOLDOWN_HOURS};

/// Reminder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: u32,
    #[serde(default = "default_activity_grace_hours")]
    pub activity_grace_hours: u32,
    #[serde(default = "default_permission_timeout_secs")]
    pub permission_timeout_secs: u64,
    #[serde(default)]
    pub cadence: CadenceConfig,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/calmnudge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub reminders: ReminderConfig,
    #[serde(default)]
    pub quiet_hours: QuietHoursConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_cooldown_hours() -> u32 {
    DEFAULT_COOLDOWN_HOURS
}
fn default_activity_grace_hours() -> u32 {
    0
}
fn default_permission_timeout_secs() -> u64 {
    60
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_hours: default_cooldown_hours(),
            activity_grace_hours: default_activity_grace_hours(),
            permission_timeout_secs: default_permission_timeout_secs(),
            cadence: CadenceConfig::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot set a whole section".to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Quiet hours must name real hours of the day.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quiet_hours
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                key: "quiet_hours".to_string(),
                message: e.to_string(),
            })
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Settings snapshot read by the scheduling engine.
    pub fn settings(&self) -> ReminderSettings {
        ReminderSettings {
            enabled: self.reminders.enabled,
            cooldown: Duration::hours(i64::from(self.reminders.cooldown_hours)),
            activity_grace: Duration::hours(i64::from(self.reminders.activity_grace_hours)),
            permission_timeout: std::time::Duration::from_secs(self.reminders.permission_timeout_secs),
            quiet_hours: self.quiet_hours,
            cadence: self.reminders.cadence,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.reminders.cooldown_hours, 72);
        assert_eq!(parsed.quiet_hours, QuietHoursConfig::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[quiet_hours]\nstart_hour = 9\nend_hour = 17\n").unwrap();
        assert!(parsed.quiet_hours.enabled);
        assert_eq!(parsed.quiet_hours.start_hour, 9);
        assert_eq!(parsed.reminders.cadence.test_days, 7);
        assert!(parsed.reminders.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("quiet_hours.start_hour").as_deref(), Some("22"));
        assert_eq!(cfg.get("reminders.cadence.test_days").as_deref(), Some("7"));
        assert!(cfg.get("reminders.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("quiet_hours.enabled", "false").unwrap();
        cfg.apply("reminders.cooldown_hours", "48").unwrap();
        assert!(!cfg.quiet_hours.enabled);
        assert_eq!(cfg.settings().cooldown, Duration::hours(48));
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("quiet_hours.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.apply("reminders.enabled", "not_a_bool").is_err());
        assert!(cfg.apply("reminders.cooldown_hours", "-3").is_err());
        assert!(cfg.apply("reminders", "{}").is_err());
    }

    #[test]
    fn apply_rejects_out_of_range_hour() {
        let mut cfg = Config::default();
        let err = cfg.apply("quiet_hours.end_hour", "24").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.quiet_hours.end_hour, 7);
    }

    #[test]
    fn settings_projection_uses_config_values() {
        let cfg = Config::default();
        let settings = cfg.settings();
        assert!(settings.enabled);
        assert_eq!(settings.cooldown, Duration::hours(72));
        assert_eq!(settings.activity_grace, Duration::zero());
        assert_eq!(settings.permission_timeout, std::time::Duration::from_secs(60));
        assert_eq!(settings, ReminderSettings::default());
    }
}
