//! ChoreRank configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ChoreError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChoreRankConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl ChoreRankConfig {
    /// Load config from the default path (~/.chorerank/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ChoreError::Config(format!("Failed to read config: {e}")))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("⚙️ Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ChoreError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Write config as TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ChoreError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the ChoreRank home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chorerank")
    }

    fn validate(&self) -> Result<()> {
        if self.scoring.penalty > 0 {
            return Err(ChoreError::Config(format!(
                "scoring.penalty must be zero or negative, got {}",
                self.scoring.penalty
            )));
        }
        if self.session.backoff_initial_secs == 0
            || self.session.backoff_max_secs < self.session.backoff_initial_secs
        {
            return Err(ChoreError::Config(
                "session backoff must satisfy 0 < backoff_initial_secs <= backoff_max_secs".into(),
            ));
        }
        let s = &self.schedule;
        for (name, trigger) in [
            ("morning_digest", &s.morning_digest),
            ("pending_notice", &s.pending_notice),
            ("penalty_sweep", &s.penalty_sweep),
            ("period_close", &s.period_close),
        ] {
            trigger
                .validate()
                .map_err(|e| ChoreError::Config(format!("schedule.{name}: {e}")))?;
        }
        Ok(())
    }
}

/// Expand `~` in a configured path.
pub fn expand_path(p: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(p).to_string())
}

/// Durable storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String { "~/.chorerank/chorerank.db".into() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self { db_path: default_db_path() }
    }
}

/// Scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Delta applied to an owner's total for every pending task at sweep time.
    #[serde(default = "default_penalty")]
    pub penalty: i64,
}

fn default_penalty() -> i64 { -1 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { penalty: default_penalty() }
    }
}

/// Transport session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,
    #[serde(default = "default_backoff_initial")]
    pub backoff_initial_secs: u64,
    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,
}

fn default_credentials_path() -> String { "~/.chorerank/auth/credentials.json".into() }
fn default_backoff_initial() -> u64 { 2 }
fn default_backoff_max() -> u64 { 60 }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            backoff_initial_secs: default_backoff_initial(),
            backoff_max_secs: default_backoff_max(),
        }
    }
}

/// Where scheduled notifications go.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// Chat/group id; empty means scheduled notifications are only logged.
    #[serde(default)]
    pub target: String,
}

/// Wall-clock triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Fixed offset from UTC for trigger times; host local time when unset.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
    #[serde(default = "default_morning_digest")]
    pub morning_digest: TriggerConfig,
    #[serde(default = "default_pending_notice")]
    pub pending_notice: TriggerConfig,
    #[serde(default = "default_penalty_sweep")]
    pub penalty_sweep: TriggerConfig,
    #[serde(default = "default_period_close")]
    pub period_close: TriggerConfig,
}

fn default_morning_digest() -> TriggerConfig { TriggerConfig::at(8, 0) }
fn default_pending_notice() -> TriggerConfig { TriggerConfig::at(20, 0) }
fn default_penalty_sweep() -> TriggerConfig { TriggerConfig::at(23, 0) }
fn default_period_close() -> TriggerConfig {
    TriggerConfig {
        days: vec![28, 29, 30, 31],
        ..TriggerConfig::at(23, 59)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: None,
            morning_digest: default_morning_digest(),
            pending_notice: default_pending_notice(),
            penalty_sweep: default_penalty_sweep(),
            period_close: default_period_close(),
        }
    }
}

/// One trigger's time of day and optional day-of-month set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
    /// Days of month the trigger may fire on; empty = every day.
    #[serde(default)]
    pub days: Vec<u32>,
}

fn bool_true() -> bool { true }

impl TriggerConfig {
    pub fn at(hour: u32, minute: u32) -> Self {
        Self {
            enabled: true,
            hour,
            minute,
            days: Vec::new(),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.hour > 23 {
            return Err(format!("hour {} out of range 0..=23", self.hour));
        }
        if self.minute > 59 {
            return Err(format!("minute {} out of range 0..=59", self.minute));
        }
        if let Some(d) = self.days.iter().find(|d| !(1..=31).contains(*d)) {
            return Err(format!("day {d} out of range 1..=31"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChoreRankConfig::default();
        assert_eq!(config.scoring.penalty, -1);
        assert_eq!(config.session.backoff_initial_secs, 2);
        assert_eq!(config.schedule.morning_digest, TriggerConfig::at(8, 0));
        assert_eq!(config.schedule.period_close.days, vec![28, 29, 30, 31]);
        assert!(config.notify.target.is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [scoring]
            penalty = -2

            [notify]
            target = "family-group"

            [schedule]
            utc_offset_minutes = -180

            [schedule.pending_notice]
            hour = 21
            minute = 30
        "#;

        let config = ChoreRankConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.scoring.penalty, -2);
        assert_eq!(config.notify.target, "family-group");
        assert_eq!(config.schedule.utc_offset_minutes, Some(-180));
        assert_eq!(config.schedule.pending_notice, TriggerConfig::at(21, 30));
        // untouched triggers keep their defaults
        assert_eq!(config.schedule.penalty_sweep, TriggerConfig::at(23, 0));
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config = ChoreRankConfig::from_toml("").unwrap();
        assert_eq!(config.storage.db_path, "~/.chorerank/chorerank.db");
        assert_eq!(config.session.backoff_max_secs, 60);
    }

    #[test]
    fn test_positive_penalty_rejected() {
        let err = ChoreRankConfig::from_toml("[scoring]\npenalty = 3").unwrap_err();
        assert!(matches!(err, ChoreError::Config(_)));
    }

    #[test]
    fn test_out_of_range_trigger_rejected() {
        let err = ChoreRankConfig::from_toml("[schedule.morning_digest]\nhour = 24").unwrap_err();
        assert!(err.to_string().contains("morning_digest"));

        let err = ChoreRankConfig::from_toml("[schedule.period_close]\nhour = 23\ndays = [0]")
            .unwrap_err();
        assert!(err.to_string().contains("day 0"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\nbackoff_initial_secs = 5\nbackoff_max_secs = 30").unwrap();
        let config = ChoreRankConfig::load_from(&path).unwrap();
        assert_eq!(config.session.backoff_initial_secs, 5);
        assert_eq!(config.session.backoff_max_secs, 30);
    }

    #[test]
    fn test_save_to_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = ChoreRankConfig::default();
        config.notify.target = "family".into();
        config.schedule.utc_offset_minutes = Some(-180);
        config.save_to(&path).unwrap();

        let loaded = ChoreRankConfig::load_from(&path).unwrap();
        assert_eq!(loaded.notify.target, "family");
        assert_eq!(loaded.schedule.utc_offset_minutes, Some(-180));
        assert_eq!(loaded.schedule.period_close.days, vec![28, 29, 30, 31]);
    }

    #[test]
    fn test_home_dir() {
        let home = ChoreRankConfig::home_dir();
        assert!(home.to_string_lossy().contains("chorerank"));
    }
}
