use crate::history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read editor config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid editor config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Editor settings. Missing keys fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum entries on each of the undo and redo stacks.
    pub history_limit: usize,
    /// Indentation for a step added at the top of a scenario body.
    pub step_indent: String,
    /// Name used by `add_scenario` when the requested one sanitizes to nothing.
    pub default_scenario_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            history_limit: DEFAULT_HISTORY_LIMIT,
            step_indent: "        ".to_string(),
            default_scenario_name: "NewScenario".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
