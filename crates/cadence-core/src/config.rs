//! TOML-based engine configuration.
//!
//! Holds the tunable constants of the engine:
//! - Ranking weights and the default preferred time
//! - Energy profile lookback and peak threshold
//! - Insight thresholds
//! - Default working hours and slot rules
//!
//! Configuration is stored at `~/.config/cadence/config.toml`.

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::energy::MAX_LOOKBACK_DAYS;
use crate::error::{ConfigError, ValidationError};
use crate::ranker::RankingWeights;
use crate::scheduler::{MAX_BUFFER_MINUTES, MAX_HORIZON_DAYS};

/// Ranking configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_priority_weight")]
    pub priority_weight: f64,
    #[serde(default = "default_factor_weight")]
    pub energy_weight: f64,
    #[serde(default = "default_factor_weight")]
    pub performance_weight: f64,
    /// Time of day assumed for tasks without a preference.
    #[serde(default = "default_preferred_time", with = "clock::hhmm")]
    pub default_preferred_time: NaiveTime,
}

/// Energy profile configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    #[serde(default = "default_peak_threshold")]
    pub peak_threshold: f64,
    #[serde(default = "default_neutral")]
    pub neutral_energy: f64,
}

/// Thresholds that decide which insights are emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightThresholds {
    /// Entries above this requirement count as high-energy.
    #[serde(default = "default_high_energy_threshold")]
    pub high_energy_threshold: f64,
    #[serde(default = "default_alignment_threshold")]
    pub alignment_threshold: f64,
    #[serde(default = "default_time_efficiency_threshold")]
    pub time_efficiency_threshold: f64,
    #[serde(default = "default_balance_threshold")]
    pub balance_threshold: f64,
}

/// Default working hours and slot rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_work_start", with = "clock::hhmm")]
    pub work_start: NaiveTime,
    #[serde(default = "default_work_end", with = "clock::hhmm")]
    pub work_end: NaiveTime,
    #[serde(default)]
    pub min_buffer_minutes: i64,
    #[serde(default)]
    pub max_tasks_per_day: Option<u32>,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/cadence/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub energy: EnergyConfig,
    #[serde(default)]
    pub insights: InsightThresholds,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

// Default functions
fn default_priority_weight() -> f64 {
    0.4
}
fn default_factor_weight() -> f64 {
    0.3
}
fn default_preferred_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}
fn default_lookback_days() -> i64 {
    30
}
fn default_peak_threshold() -> f64 {
    0.75
}
fn default_neutral() -> f64 {
    0.5
}
fn default_high_energy_threshold() -> f64 {
    0.7
}
fn default_alignment_threshold() -> f64 {
    0.8
}
fn default_time_efficiency_threshold() -> f64 {
    0.8
}
fn default_balance_threshold() -> f64 {
    0.5
}
pub(crate) fn default_work_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}
pub(crate) fn default_work_end() -> NaiveTime {
    NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN)
}
pub(crate) fn default_horizon_days() -> u32 {
    7
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            priority_weight: default_priority_weight(),
            energy_weight: default_factor_weight(),
            performance_weight: default_factor_weight(),
            default_preferred_time: default_preferred_time(),
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            peak_threshold: default_peak_threshold(),
            neutral_energy: default_neutral(),
        }
    }
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            high_energy_threshold: default_high_energy_threshold(),
            alignment_threshold: default_alignment_threshold(),
            time_efficiency_threshold: default_time_efficiency_threshold(),
            balance_threshold: default_balance_threshold(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            work_start: default_work_start(),
            work_end: default_work_end(),
            min_buffer_minutes: 0,
            max_tasks_per_day: None,
            horizon_days: default_horizon_days(),
        }
    }
}

/// Returns `~/.config/cadence[-dev]/` based on CADENCE_ENV.
///
/// Set CADENCE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir().ok_or(ConfigError::NoConfigDir)?.join(".config");

    let env = std::env::var("CADENCE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("cadence-dev")
    } else {
        base_dir.join("cadence")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::SaveFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

impl EngineConfig {
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
        let mut current = root;
        while let Some(part) = parts.next() {
            if part.is_empty() {
                break;
            }
            if parts.peek().is_none() {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
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
                    // Unset optionals accept JSON literals ("4", "null")
                    serde_json::Value::Null => serde_json::from_str(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.into())),
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

    /// Default location of the configuration file.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from `path`, or return defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// fails validation.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })
            }
        };

        let cfg: EngineConfig = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.validate().map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(cfg)
    }

    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from the default location, returning defaults on any error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by dot-separated key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid. On error `self` is left
    /// unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: EngineConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        *self = updated;
        Ok(())
    }

    /// Ranking weights from the `[ranking]` section.
    pub fn ranking_weights(&self) -> Result<RankingWeights, ValidationError> {
        RankingWeights::new(
            self.ranking.priority_weight,
            self.ranking.energy_weight,
            self.ranking.performance_weight,
        )
    }

    /// Check ranges and cross-field rules.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ranking_weights()?;

        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.energy.lookback_days) {
            return Err(ValidationError::value(
                "energy.lookback_days",
                format!("{} is outside 1-{MAX_LOOKBACK_DAYS}", self.energy.lookback_days),
            ));
        }
        for (field, v) in [
            ("energy.peak_threshold", self.energy.peak_threshold),
            ("energy.neutral_energy", self.energy.neutral_energy),
            ("insights.high_energy_threshold", self.insights.high_energy_threshold),
            ("insights.alignment_threshold", self.insights.alignment_threshold),
            ("insights.time_efficiency_threshold", self.insights.time_efficiency_threshold),
            ("insights.balance_threshold", self.insights.balance_threshold),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ValidationError::value(field, format!("{v} is outside 0.0-1.0")));
            }
        }

        if self.schedule.work_start >= self.schedule.work_end {
            return Err(ValidationError::InvalidTimeRange {
                what: "schedule working hours".to_string(),
                start: clock::format_hhmm(self.schedule.work_start),
                end: clock::format_hhmm(self.schedule.work_end),
            });
        }
        if !(0..=MAX_BUFFER_MINUTES).contains(&self.schedule.min_buffer_minutes) {
            return Err(ValidationError::value(
                "schedule.min_buffer_minutes",
                format!("{} is outside 0-{MAX_BUFFER_MINUTES}", self.schedule.min_buffer_minutes),
            ));
        }
        if !(1..=MAX_HORIZON_DAYS).contains(&self.schedule.horizon_days) {
            return Err(ValidationError::value(
                "schedule.horizon_days",
                format!("{} is outside 1-{MAX_HORIZON_DAYS}", self.schedule.horizon_days),
            ));
        }
        if self.schedule.max_tasks_per_day == Some(0) {
            return Err(ValidationError::value("schedule.max_tasks_per_day", "must be at least 1"));
        }
        Ok(())
    }
}
