use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use framescout_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use framescout_core::search::domain::search_strategy::StrategyKind;
use framescout_core::shared::constants::{APP_DIR_NAME, DEFAULT_TARGET_CLASS};

/// Defaults read from `settings.json`; command-line flags override them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub target: String,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub model: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub pool_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET_CLASS.to_string(),
            strategy: StrategyKind::Binary,
            confidence: DEFAULT_CONFIDENCE,
            model: None,
            timeout_secs: None,
            pool_size: 1,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads an explicitly requested file; a missing or malformed file is an
    /// error.
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("Cannot read settings {}: {e}", path.display()))?;
        let settings = serde_json::from_str(&json)
            .map_err(|e| format!("Invalid settings {}: {e}", path.display()))?;
        Ok(settings)
    }

    /// Loads `explicit` if given, else the default location. The default
    /// file is optional: if it is absent or unreadable the built-in defaults
    /// apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        let Some(path) = Self::default_path().filter(|p| p.is_file()) else {
            return Ok(Self::default());
        };
        match Self::load_from(&path) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Ok(Self::default())
            }
        }
    }
}
