//! Configuration file support for Fastwatch.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fastwatch/config.toml`.
//! Every section is optional; missing sections fall back to the built-in
//! tables in [`crate::defaults`].

use crate::defaults::{build_default_phase_table, build_default_refeed_table};
use crate::history::GapPolicy;
use crate::{Error, PhaseTable, RefeedTable, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default = "build_default_phase_table")]
    pub phases: PhaseTable,

    #[serde(default = "build_default_refeed_table")]
    pub refeed: RefeedTable,

    #[serde(default)]
    pub history: GapPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            phases: build_default_phase_table(),
            refeed: build_default_refeed_table(),
            history: GapPolicy::default(),
        }
    }
}

/// Data location configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Event feed file name, relative to `data_dir`
    #[serde(default = "default_feed_file")]
    pub feed_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            feed_file: default_feed_file(),
        }
    }
}

impl DataConfig {
    /// Full path of the event feed inside `data_dir`
    pub fn feed_path(&self) -> PathBuf {
        self.data_dir.join(&self.feed_file)
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("fastwatch")
}

fn default_feed_file() -> String {
    "events.json".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!(
            "Loaded config from {:?} (phase table v{}, refeed table v{})",
            path,
            config.phases.version,
            config.refeed.version
        );
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("fastwatch").join("config.toml")
    }

    /// Check every table invariant, collecting all problems into one error
    pub fn validate(&self) -> Result<()> {
        let mut errors = self.phases.validate();
        errors.extend(self.refeed.validate());
        errors.extend(self.history.validate());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Config(errors.join("; ")))
        }
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
