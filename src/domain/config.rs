use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for grade tracking.
///
/// This struct holds settings that control how students are classified and
/// where rosters are stored by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The minimum average grade a student needs to be considered passing.
    passing_threshold: i32,

    /// The roster file used when the user does not name one.
    pub default_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            passing_threshold: default_passing_threshold(),
            default_file: None,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the minimum average grade for a passing student.
    #[must_use]
    pub const fn passing_threshold(&self) -> i32 {
        self.passing_threshold
    }

    /// Sets the minimum average grade for a passing student.
    pub const fn set_passing_threshold(&mut self, value: i32) {
        self.passing_threshold = value;
    }

    /// Returns the default roster file, if configured.
    #[must_use]
    pub fn default_file(&self) -> Option<&Path> {
        self.default_file.as_deref()
    }
}

const fn default_passing_threshold() -> i32 {
    50
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        /// The minimum average grade for a passing student.
        #[serde(default = "default_passing_threshold")]
        passing_threshold: i32,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        default_file: Option<PathBuf>,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                passing_threshold,
                default_file,
            } => Self {
                passing_threshold,
                default_file,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            passing_threshold: config.passing_threshold,
            default_file: config.default_file,
        }
    }
}
