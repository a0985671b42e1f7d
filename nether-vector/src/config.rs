//! Display configuration
//!
//! Supplied at bring-up, before the renderer starts. The `[display]` section
//! of the player's `config.toml` deserializes straight into [`DisplayConfig`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Renderer and buffer sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Capacity of each vertex buffer (default: 8192)
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    /// Samples per device transfer (default: 1024)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Repeat short vertex lists to fill the buffer before publishing (default: false)
    #[serde(default)]
    pub replay_fill: bool,
    /// Pause between render cycles in microseconds, 0 yields instead (default: 0)
    #[serde(default)]
    pub yield_interval_us: u64,
    /// Priority hint passed to the spawner (default: 24)
    #[serde(default = "default_task_priority")]
    pub task_priority: u8,
}

fn default_max_points() -> usize {
    8192
}
fn default_batch_size() -> usize {
    1024
}
fn default_task_priority() -> u8 {
    24
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_points: default_max_points(),
            batch_size: default_batch_size(),
            replay_fill: false,
            yield_interval_us: 0,
            task_priority: default_task_priority(),
        }
    }
}

impl DisplayConfig {
    /// Reject sizes the renderer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_points == 0 {
            return Err(ConfigError::Invalid {
                field: "display.max_points",
                value: self.max_points.to_string(),
                reason: "must be at least 1",
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "display.batch_size",
                value: self.batch_size.to_string(),
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}
