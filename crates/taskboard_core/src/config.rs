//! Typed runtime configuration for the board core.
//!
//! # Responsibility
//! - Hold position spacing, cache sizing and field length limits.
//! - Load partial JSON documents on top of built-in defaults.
//!
//! # Invariants
//! - A `CoreConfig` handed to services has passed `validate()`.

use crate::position::PositionAllocator;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

const DEFAULT_INTERVAL: i64 = 1024;
const DEFAULT_COLLAPSE_THRESHOLD: i64 = 1;
/// Largest accepted spacing; keeps `k * interval` far from `i64::MAX` and
/// inside the exact integer range of `f64`.
pub const MAX_POSITION_INTERVAL: i64 = 1 << 32;

/// Errors from configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// Document is not valid JSON or has unknown/mistyped keys.
    Parse(serde_json::Error),
    /// A value is outside its allowed range.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config document: {err}"),
            Self::Invalid(message) => write!(f, "invalid config value: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub positions: PositionSettings,
    pub cache: CacheSettings,
    pub limits: FieldLimits,
}

impl CoreConfig {
    /// Parses a JSON document; missing keys keep their defaults.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positions = &self.positions;
        if positions.list_collapse_threshold < 0 {
            return Err(ConfigError::Invalid(
                "positions.list_collapse_threshold must not be negative".to_string(),
            ));
        }
        if positions.list_interval <= positions.list_collapse_threshold {
            return Err(ConfigError::Invalid(format!(
                "positions.list_interval ({}) must exceed list_collapse_threshold ({})",
                positions.list_interval, positions.list_collapse_threshold
            )));
        }
        if positions.list_interval > MAX_POSITION_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "positions.list_interval ({}) must not exceed {MAX_POSITION_INTERVAL}",
                positions.list_interval
            )));
        }
        if !positions.task_collapse_threshold.is_finite() || positions.task_collapse_threshold < 0.0
        {
            return Err(ConfigError::Invalid(
                "positions.task_collapse_threshold must be a non-negative number".to_string(),
            ));
        }
        if !positions.task_interval.is_finite()
            || positions.task_interval <= positions.task_collapse_threshold
        {
            return Err(ConfigError::Invalid(format!(
                "positions.task_interval ({}) must exceed task_collapse_threshold ({})",
                positions.task_interval, positions.task_collapse_threshold
            )));
        }
        if positions.task_interval > MAX_POSITION_INTERVAL as f64 {
            return Err(ConfigError::Invalid(format!(
                "positions.task_interval ({}) must not exceed {MAX_POSITION_INTERVAL}",
                positions.task_interval
            )));
        }
        if self.cache.board_view_max_entries == 0 {
            return Err(ConfigError::Invalid(
                "cache.board_view_max_entries must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("limits.board_name_max", self.limits.board_name_max),
            ("limits.list_name_max", self.limits.list_name_max),
            ("limits.task_title_max", self.limits.task_title_max),
            ("limits.description_max", self.limits.description_max),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

/// Spacing of order keys per aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PositionSettings {
    pub list_interval: i64,
    pub list_collapse_threshold: i64,
    pub task_interval: f64,
    pub task_collapse_threshold: f64,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            list_interval: DEFAULT_INTERVAL,
            list_collapse_threshold: DEFAULT_COLLAPSE_THRESHOLD,
            task_interval: DEFAULT_INTERVAL as f64,
            task_collapse_threshold: DEFAULT_COLLAPSE_THRESHOLD as f64,
        }
    }
}

impl PositionSettings {
    pub fn list_allocator(&self) -> PositionAllocator<i64> {
        PositionAllocator::new(self.list_interval, self.list_collapse_threshold)
    }

    pub fn task_allocator(&self) -> PositionAllocator<f64> {
        PositionAllocator::new(self.task_interval, self.task_collapse_threshold)
    }
}

/// Board view cache sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSettings {
    /// Seconds a loaded view may be served before it is reloaded.
    pub board_view_ttl_secs: u64,
    pub board_view_max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            board_view_ttl_secs: 30 * 60,
            board_view_max_entries: 256,
        }
    }
}

impl CacheSettings {
    pub fn board_view_ttl(&self) -> Duration {
        Duration::from_secs(self.board_view_ttl_secs)
    }
}

/// Maximum lengths, in characters, of user-provided text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldLimits {
    pub board_name_max: usize,
    pub list_name_max: usize,
    pub task_title_max: usize,
    pub description_max: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            board_name_max: 255,
            list_name_max: 255,
            task_title_max: 128,
            description_max: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, MAX_POSITION_INTERVAL};

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_json_str("{}").expect("empty document should parse");
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.positions.list_interval, 1024);
        assert_eq!(config.limits.task_title_max, 128);
        assert_eq!(config.cache.board_view_ttl().as_secs(), 1800);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = CoreConfig::from_json_str(r#"{"positions": {"task_interval": 65536.0}}"#)
            .expect("partial document should parse");
        assert_eq!(config.positions.task_interval, 65536.0);
        assert_eq!(config.positions.list_interval, 1024);
        assert_eq!(config.positions.task_allocator().interval(), 65536.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = CoreConfig::from_json_str(r#"{"cache": {"ttl": 5}}"#)
            .expect_err("unknown key must fail");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn interval_must_exceed_threshold() {
        let err = CoreConfig::from_json_str(
            r#"{"positions": {"list_interval": 1, "list_collapse_threshold": 1}}"#,
        )
        .expect_err("interval equal to threshold must fail");
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("list_interval")));
    }

    #[test]
    fn oversized_intervals_are_rejected() {
        let err = CoreConfig::from_json_str(
            r#"{"positions": {"list_interval": 6000000000000000000}}"#,
        )
        .expect_err("list interval near i64::MAX must fail");
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("list_interval")));

        let err = CoreConfig::from_json_str(r#"{"positions": {"task_interval": 1e300}}"#)
            .expect_err("huge task interval must fail");
        assert!(matches!(err, ConfigError::Invalid(message) if message.contains("task_interval")));

        let document = format!(r#"{{"positions": {{"list_interval": {MAX_POSITION_INTERVAL}}}}}"#);
        let config = CoreConfig::from_json_str(&document).expect("largest interval is accepted");
        assert_eq!(config.positions.list_interval, MAX_POSITION_INTERVAL);
    }

    #[test]
    fn zero_cache_capacity_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"cache": {"board_view_max_entries": 0}}"#)
            .expect_err("zero capacity must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
