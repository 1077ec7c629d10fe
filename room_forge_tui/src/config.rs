use std::path::Path;

use anyhow::{Context, Result, ensure};
use room_forge_core::{GeneratorConfig, RewardTable};
use serde::{Deserialize, Serialize};

/// Settings read from the optional JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub generator: GeneratorConfig,
    pub rewards: RewardTable,
    /// Turns before an episode ends without the agent leaving the room.
    pub max_steps: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            generator: GeneratorConfig::default(),
            rewards: RewardTable::default(),
            max_steps: 5000,
        }
    }
}

impl AppConfig {
    /// Reads `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.generator.validate()?;
        ensure!(self.max_steps > 0, "max_steps must be at least 1");
        Ok(())
    }
}
