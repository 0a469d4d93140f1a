//! Configuration system

pub use serde::{Serialize, Deserialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Value outside its allowed range
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// What registration does when a collection's bounding radius cannot contain its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundingRadiusPolicy {
    /// Accept the authored radius as is
    Ignore,
    /// Accept it and log a warning
    #[default]
    Warn,
    /// Refuse to register the collection
    Reject,
    /// Grow the radius to the required size
    Expand,
}

/// Process-wide settings for one cast system instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LagCompensationConfig {
    /// Frames retained per history buffer
    pub history_capacity: usize,
    /// Seconds between recorded frames
    pub store_interval: f64,
    /// Bounding sphere validation at registration
    pub bounding_radius_policy: BoundingRadiusPolicy,
}

impl Default for LagCompensationConfig {
    fn default() -> Self {
        Self {
            history_capacity: 40,
            store_interval: 0.2,
            bounding_radius_policy: BoundingRadiusPolicy::default(),
        }
    }
}

impl Config for LagCompensationConfig {}

impl LagCompensationConfig {
    /// Check that every field is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "history_capacity",
                reason: "must retain at least one frame".to_string(),
            });
        }
        if !(self.store_interval.is_finite() && self.store_interval > 0.0) {
            return Err(ConfigError::Invalid {
                field: "store_interval",
                reason: format!("must be a positive number of seconds, got {}", self.store_interval),
            });
        }
        Ok(())
    }

    /// Seconds of history covered by a full buffer
    pub fn history_span(&self) -> f64 {
        self.history_capacity as f64 * self.store_interval
    }
}
