use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    /// Name attached to log events and stats.
    pub name: String,
    /// Initial capacity of the task queue.
    pub queue_capacity: usize,
    /// Run pending tasks on shutdown instead of discarding them.
    pub drain_on_shutdown: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            name: "event-loop".to_string(),
            queue_capacity: 64,
            drain_on_shutdown: false,
        }
    }
}

impl LoopConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LoopConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        Ok(())
    }
}
