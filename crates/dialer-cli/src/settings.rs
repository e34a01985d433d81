//! CLI settings file
//!
//! Read from `<config dir>/dialer/config.toml` unless `--config` points
//! elsewhere. A missing file means defaults; every section is optional.
//!
//! ```toml
//! [dialer]
//! use_system_ui = false
//! prefill_number = "+91 9119515866"
//!
//! [logging]
//! level = "info"
//!
//! [simulation]
//! latency_ms = 300
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialer_core::DialerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dialer: DialerConfig,
    pub logging: LogSettings,
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file_info: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
            file_info: false,
        }
    }
}

/// How the simulated platform behaves
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Delay before each simulated platform answer
    pub latency_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self { latency_ms: 250 }
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dialer").join("config.toml"))
}

impl Settings {
    /// Load from `path`, or the default location when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.dialer.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
