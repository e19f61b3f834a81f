//! Engine configuration
//!
//! Every section deserializes with defaults, so a host can ship a partial
//! JSON document and override only what it cares about.

use serde::{Deserialize, Serialize};
use visage_core::{VisageError, VisageResult};
use visage_face::{FaceConfig, IdleConfig};
use visage_sync::SyncConfig;

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Structured output for log collectors
    pub fn production() -> Self {
        LoggingConfig {
            json: true,
            ..Self::default()
        }
    }

    /// Verbose human-readable output
    pub fn development() -> Self {
        LoggingConfig {
            level: "debug".to_string(),
            ..Self::default()
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub sync: SyncConfig,
    pub face: FaceConfig,
    pub idle: IdleConfig,
    pub logging: LoggingConfig,
    /// Lines kept in the user-facing log
    pub user_log_capacity: usize,
    /// Duration hint used when a response carries neither a duration nor
    /// any timed cue (seconds)
    pub default_duration_secs: f64,
    /// Frame rate of the host driver's ticker
    pub display_rate_hz: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            sync: SyncConfig::default(),
            face: FaceConfig::default(),
            idle: IdleConfig::default(),
            logging: LoggingConfig::default(),
            user_log_capacity: 200,
            default_duration_secs: 1.0,
            display_rate_hz: 60.0,
        }
    }
}

impl EngineConfig {
    /// Reduced frame and mouth rates
    pub fn low_power() -> Self {
        EngineConfig {
            sync: SyncConfig::low_power(),
            face: FaceConfig::low_power(),
            display_rate_hz: 30.0,
            ..Self::default()
        }
    }

    /// Fixed seed and no procedural motion, for reproducible runs
    pub fn deterministic(seed: u64) -> Self {
        EngineConfig {
            idle: IdleConfig {
                seed: Some(seed),
                ..IdleConfig::still()
            },
            ..Self::default()
        }
    }

    /// Parse and validate a (possibly partial) JSON document
    pub fn from_json_str(json: &str) -> VisageResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| VisageError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VisageResult<()> {
        self.sync.validate()?;
        self.face.validate()?;
        self.idle.validate()?;
        if self.user_log_capacity == 0 {
            return Err(VisageError::InvalidConfig(
                "user_log_capacity must be positive".to_string(),
            ));
        }
        if !(self.default_duration_secs.is_finite() && self.default_duration_secs > 0.0) {
            return Err(VisageError::InvalidConfig(
                "default_duration_secs must be positive".to_string(),
            ));
        }
        if !(self.display_rate_hz.is_finite() && self.display_rate_hz > 0.0) {
            return Err(VisageError::InvalidConfig(
                "display_rate_hz must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!(EngineConfig::low_power().validate().is_ok());
        assert!(EngineConfig::deterministic(7).validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json_str(
            r#"{ "sync": { "visual_rate_hz": 24.0 }, "idle": { "seed": 42 } }"#,
        )
        .unwrap();

        assert_eq!(config.sync.visual_rate_hz, 24.0);
        assert_eq!(config.sync.completion_ratio, 0.99);
        assert_eq!(config.idle.seed, Some(42));
        assert_eq!(config.face, FaceConfig::default());
        assert_eq!(config.user_log_capacity, 200);
    }

    #[test]
    fn test_rejects_invalid() {
        let err = EngineConfig::from_json_str(r#"{ "user_log_capacity": 0 }"#).unwrap_err();
        assert!(matches!(err, VisageError::InvalidConfig(_)));

        let err = EngineConfig::from_json_str(r#"{ "sync": { "completion_ratio": 0.0 } }"#)
            .unwrap_err();
        assert!(matches!(err, VisageError::InvalidConfig(_)));

        let err = EngineConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, VisageError::InvalidConfig(_)));
    }
}
