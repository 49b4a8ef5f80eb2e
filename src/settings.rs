//! Engine settings

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of the velocity engine.
///
/// The evaluation window and the retention horizon are independent: the
/// window is a sub-filter over the retained history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocitySettings {
    /// Sliding window counted for risk evaluation
    pub window_secs: u64,
    /// Maximum age of a retained record
    pub retention_secs: u64,
    /// Category used when the resolver is unavailable
    pub default_category: String,
    /// Configuration namespace holding category limits
    pub limits_namespace: String,
    /// Upper bound on a single dispatcher call
    pub dispatch_timeout_millis: Option<u64>,
}

impl Default for VelocitySettings {
    fn default() -> Self {
        Self {
            window_secs: 60 * 60,
            retention_secs: 24 * 60 * 60,
            default_category: "default".to_string(),
            limits_namespace: "fraud_limits".to_string(),
            dispatch_timeout_millis: None,
        }
    }
}

impl VelocitySettings {
    /// Parse and validate settings from a TOML document. Missing keys take
    /// their defaults.
    pub fn from_toml(document: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(document)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs == 0 {
            return Err(ConfigError::Invalid("window_secs must be positive".into()));
        }
        if self.window_secs > self.retention_secs {
            return Err(ConfigError::Invalid(
                format!(
                    "window_secs ({}) exceeds retention_secs ({})",
                    self.window_secs, self.retention_secs
                )
                .into(),
            ));
        }
        if self.default_category.is_empty() {
            return Err(ConfigError::Invalid("default_category must not be empty".into()));
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn dispatch_timeout(&self) -> Option<Duration> {
        self.dispatch_timeout_millis.map(Duration::from_millis)
    }
}
