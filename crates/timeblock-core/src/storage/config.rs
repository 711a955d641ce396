//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Default block lengths and the work-set size
//! - Sound cue volumes and toggles
//! - Notification and persistence settings
//! - The global hotkey accelerator
//!
//! Configuration is stored at `<data_dir>/config.toml`. The engine owns a
//! copy and only changes it through `BlockEngine::apply_config`.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::block::BlockKind;
use crate::error::ConfigError;
use crate::timer::SequencingPolicy;

/// Default lengths and the work/break cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    #[serde(default = "default_work_intervals_in_set")]
    pub work_intervals_in_set: u32,
    /// Return to idle after a break instead of starting the next work block.
    #[serde(default)]
    pub stop_after_break: bool,
}

/// Sound cue configuration. Volumes range over `[0, 2]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundsConfig {
    #[serde(default = "default_volume")]
    pub windup_volume: f64,
    #[serde(default = "default_volume")]
    pub ding_volume: f64,
    #[serde(default = "default_volume")]
    pub ticking_volume: f64,
    #[serde(default = "default_true")]
    pub windup_enabled: bool,
    #[serde(default = "default_true")]
    pub ding_enabled: bool,
    #[serde(default = "default_true")]
    pub ticking_enabled: bool,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON file per document.
    #[default]
    Json,
    /// One SQLite key-value row per document.
    Sqlite,
}

/// Persistence backend and write coalescing windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_state_debounce_ms")]
    pub state_debounce_ms: u64,
    #[serde(default = "default_state_max_wait_ms")]
    pub state_max_wait_ms: u64,
    #[serde(default = "default_stats_debounce_ms")]
    pub stats_debounce_ms: u64,
    #[serde(default = "default_stats_max_wait_ms")]
    pub stats_max_wait_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub sounds: SoundsConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Accelerator for the external hotkey binder; always toggles the
    /// current block.
    #[serde(default)]
    pub hotkey: Option<String>,
}

// Default functions
fn default_work_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_work_intervals_in_set() -> u32 {
    4
}
fn default_volume() -> f64 {
    1.0
}
fn default_true() -> bool {
    true
}
fn default_state_debounce_ms() -> u64 {
    1_000
}
fn default_state_max_wait_ms() -> u64 {
    5_000
}
fn default_stats_debounce_ms() -> u64 {
    5_000
}
fn default_stats_max_wait_ms() -> u64 {
    60_000
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            work_intervals_in_set: default_work_intervals_in_set(),
            stop_after_break: false,
        }
    }
}

impl Default for SoundsConfig {
    fn default() -> Self {
        Self {
            windup_volume: 1.0,
            ding_volume: 1.0,
            ticking_volume: 1.0,
            windup_enabled: true,
            ding_enabled: true,
            ticking_enabled: true,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            state_debounce_ms: default_state_debounce_ms(),
            state_max_wait_ms: default_state_max_wait_ms(),
            stats_debounce_ms: default_stats_debounce_ms(),
            stats_max_wait_ms: default_stats_max_wait_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            sounds: SoundsConfig::default(),
            notifications: NotificationsConfig::default(),
            persistence: PersistenceConfig::default(),
            hotkey: None,
        }
    }
}

impl PersistenceConfig {
    pub fn state_window(&self) -> Duration {
        Duration::from_millis(self.state_debounce_ms)
    }

    pub fn state_max_wait(&self) -> Duration {
        Duration::from_millis(self.state_max_wait_ms)
    }

    pub fn stats_window(&self) -> Duration {
        Duration::from_millis(self.stats_debounce_ms)
    }

    pub fn stats_max_wait(&self) -> Duration {
        Duration::from_millis(self.stats_max_wait_ms)
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
                            .map_err(|e| invalid(format!("cannot parse '{value}' as bool: {e}")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
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

    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or is
    /// invalid, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
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

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
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

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };

        let s = &self.schedule;
        for (key, minutes) in [
            ("schedule.work_duration", s.work_duration),
            ("schedule.short_break", s.short_break),
            ("schedule.long_break", s.long_break),
        ] {
            if minutes == 0 {
                return invalid(key, "must be at least 1 minute");
            }
        }
        if s.work_intervals_in_set == 0 {
            return invalid("schedule.work_intervals_in_set", "must be at least 1");
        }

        let v = &self.sounds;
        for (key, volume) in [
            ("sounds.windup_volume", v.windup_volume),
            ("sounds.ding_volume", v.ding_volume),
            ("sounds.ticking_volume", v.ticking_volume),
        ] {
            if !(0.0..=2.0).contains(&volume) {
                return invalid(key, "must be within [0, 2]");
            }
        }

        let p = &self.persistence;
        if p.state_max_wait_ms < p.state_debounce_ms || p.stats_max_wait_ms < p.stats_debounce_ms {
            return invalid("persistence", "max wait must not be shorter than the debounce window");
        }
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

    /// Set a config value by key without saving. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// or is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Default length in minutes for blocks of `kind`.
    pub fn default_duration(&self, kind: BlockKind) -> u32 {
        match kind {
            BlockKind::Work => self.schedule.work_duration,
            BlockKind::ShortBreak => self.schedule.short_break,
            BlockKind::LongBreak => self.schedule.long_break,
        }
    }

    pub fn sequencing_policy(&self) -> SequencingPolicy {
        SequencingPolicy {
            work_intervals_in_set: self.schedule.work_intervals_in_set,
            stop_after_break: self.schedule.stop_after_break,
        }
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
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert_eq!(parsed.schedule.work_intervals_in_set, 4);
        assert_eq!(parsed.persistence.backend, StoreBackend::Json);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("schedule.stop_after_break").as_deref(), Some("false"));
        assert_eq!(cfg.get("schedule.work_duration").as_deref(), Some("25"));
        assert_eq!(cfg.get("persistence.backend").as_deref(), Some("json"));
        assert!(cfg.get("schedule.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("schedule.stop_after_break", "true").unwrap();
        cfg.set("schedule.work_intervals_in_set", "2").unwrap();
        cfg.set("sounds.ding_volume", "1.5").unwrap();
        cfg.set("persistence.backend", "sqlite").unwrap();
        assert!(cfg.schedule.stop_after_break);
        assert_eq!(cfg.schedule.work_intervals_in_set, 2);
        assert_eq!(cfg.sounds.ding_volume, 1.5);
        assert_eq!(cfg.persistence.backend, StoreBackend::Sqlite);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("ui.dark_mode", "true"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("schedule.stop_after_break", "not_a_bool").is_err());
        assert!(cfg.set("persistence.backend", "yaml").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn validate_rejects_out_of_range_volume() {
        let mut cfg = Config::default();
        assert!(cfg.set("sounds.ticking_volume", "2.5").is_err());
        cfg.sounds.ticking_volume = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_lengths() {
        let mut cfg = Config::default();
        cfg.schedule.short_break = 0;
        assert!(cfg.validate().is_err());
        let mut cfg = Config::default();
        cfg.schedule.work_intervals_in_set = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn default_duration_per_kind() {
        let cfg = Config::default();
        assert_eq!(cfg.default_duration(BlockKind::Work), 25);
        assert_eq!(cfg.default_duration(BlockKind::ShortBreak), 5);
        assert_eq!(cfg.default_duration(BlockKind::LongBreak), 15);
    }
}
