//! Configuration loading and management
//!
//! Handles parsing of `.taskboard.toml` configuration files.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".taskboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Board file settings
    #[serde(default)]
    pub board: BoardConfig,

    /// Display settings for list output
    #[serde(default)]
    pub display: DisplayConfig,

    /// Deadline handling
    #[serde(default)]
    pub deadlines: DeadlineConfig,
}

/// Board file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Board file used when `--board` is not given
    #[serde(default = "default_board_file")]
    pub file: PathBuf,
}

fn default_board_file() -> PathBuf {
    PathBuf::from("board.json")
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            file: default_board_file(),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Characters of the description shown in task lists
    #[serde(default = "default_description_preview")]
    pub description_preview: usize,
}

fn default_description_preview() -> usize {
    120
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            description_preview: default_description_preview(),
        }
    }
}

/// Deadline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineConfig {
    /// Deadlines this many days away or fewer count as "soon" in stats
    #[serde(default = "default_soon_days")]
    pub soon_days: i64,

    /// Offset used by `--deadline-in` when no value is given
    #[serde(default = "default_offset_days")]
    pub default_offset_days: i64,

    /// Date-only deadlines mean the end of that day (23:59:59 UTC)
    #[serde(default = "default_true")]
    pub end_of_day: bool,
}

fn default_soon_days() -> i64 {
    3
}

fn default_offset_days() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self {
            soon_days: default_soon_days(),
            default_offset_days: default_offset_days(),
            end_of_day: default_true(),
        }
    }
}

impl DeadlineConfig {
    /// Deadline instant for a calendar date.
    pub fn deadline_for(&self, date: NaiveDate) -> DateTime<Utc> {
        let time = if self.end_of_day {
            NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
        } else {
            NaiveTime::default()
        };
        date.and_time(time).and_utc()
    }

    fn validate(&self) -> Result<()> {
        if !(0..=365).contains(&self.soon_days) {
            return Err(Error::InvalidConfig(
                "deadlines.soon_days must be between 0 and 365".to_string(),
            ));
        }
        if self.default_offset_days < 0 {
            return Err(Error::InvalidConfig(
                "deadlines.default_offset_days cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a `.taskboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &Path) -> Self {
        Self::load_from_dir_reporting(dir).0
    }

    /// Like [`Config::load_from_dir`], also returning a message for the user
    /// when an existing config file was ignored.
    pub fn load_from_dir_reporting(dir: &Path) -> (Self, Option<String>) {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return (Self::default(), None);
        }
        match Self::load(&config_path) {
            Ok(config) => (config, None),
            Err(err) => {
                tracing::warn!(path = %config_path.display(), %err, "ignoring invalid config");
                let message = format!(
                    "ignoring {} and using defaults: {err}",
                    config_path.display()
                );
                (Self::default(), Some(message))
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.board.file.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("board.file cannot be empty".to_string()));
        }
        if self.display.description_preview == 0 {
            return Err(Error::InvalidConfig(
                "display.description_preview must be >= 1".to_string(),
            ));
        }
        self.deadlines.validate()
    }
}
