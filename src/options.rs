//! Render options and the optional TOML configuration file.
//!
//! ```toml
//! history_capacity = 16
//!
//! [render]
//! mode = "supervisor"
//! max_file_bytes = 500000
//! detect_binary = true
//! ```

use error_set::error_set;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Default per-file byte budget for reconstructed output.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 2_000_000;

/// Default number of renders kept in an analysis history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 32;

error_set! {
    /// Render options that cannot produce meaningful output
    OptionsError := {
        #[display("max_file_bytes must be greater than zero")]
        ZeroByteBudget,
    }

    /// Errors loading a configuration file
    ConfigError := {
        #[display("Failed to read config {path}: {message}")]
        ReadFailed { path: String, message: String },
        #[display("Invalid config {path}: {message}")]
        InvalidToml { path: String, message: String },
    }
}

/// Output flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every line of each changed file, annotated
    #[default]
    Full,
    /// Changed lines only, grouped by hunk
    Hunks,
    /// Compact summary for automated review
    Supervisor,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Full => "full",
            Mode::Hunks => "hunks",
            Mode::Supervisor => "supervisor",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Byte budget for one file's reconstructed lines
    pub max_file_bytes: u64,
    /// Sniff fetched content for NUL bytes in addition to the diff's own
    /// binary markers
    pub detect_binary: bool,
    pub mode: Mode,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            detect_binary: true,
            mode: Mode::Full,
        }
    }
}

impl RenderOptions {
    /// Reject options that would make every file degenerate.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_file_bytes == 0 {
            return Err(OptionsError::ZeroByteBudget);
        }
        Ok(())
    }
}

/// Contents of a configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub render: RenderOptions,
    pub history_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl Config {
    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&text, &path.display().to_string())
    }

    /// Parse configuration text; `origin` names it in error messages.
    pub fn from_toml(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::InvalidToml {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }
}
