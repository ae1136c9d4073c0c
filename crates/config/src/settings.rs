// Run settings
// Loaded from an explicit --config path or ~/.config/carfeed/config.toml

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::{clean_sources, discover_sources, DEFAULT_PREFIXES};

pub const DEFAULT_OUTPUT: &str = "vehicles.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable naming the output file when nothing else does.
pub const OUTPUT_ENV: &str = "JSON_FILE";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, message } => {
                write!(f, "cannot read settings file {}: {}", path.display(), message)
            }
            ConfigError::Parse { path, message } => {
                write!(f, "invalid settings file {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Contents of the TOML settings file. Every key is optional.
///
/// ```toml
/// sources = ["https://dealer.example/estoque.json"]
/// output = "out/vehicles.json"
/// timeout_secs = 20
/// env_prefixes = ["JSON_URL", "XML_URL", "STOCK_URL"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedSettings {
    pub sources: Vec<String>,
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    /// Replaces the default discovery prefixes.
    pub env_prefixes: Option<Vec<String>>,
}

impl FeedSettings {
    /// Default settings file location.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("carfeed")
            .join("config.toml")
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&text, path)
    }

    /// Load an explicit file, or the default location when it exists.
    /// No file at all means default settings.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let path = Self::config_path();
        if path.is_file() {
            log::debug!("using settings from {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    fn prefixes(&self) -> Vec<&str> {
        match &self.env_prefixes {
            Some(list) if !list.is_empty() => list.iter().map(String::as_str).collect(),
            _ => DEFAULT_PREFIXES.to_vec(),
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub urls: Vec<String>,
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Fully resolved parameters for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub sources: Vec<String>,
    pub output: PathBuf,
    pub timeout: Duration,
}

impl RunConfig {
    /// Apply precedence: command line, then settings file, then environment,
    /// then built-in defaults.
    pub fn resolve(overrides: &Overrides, settings: &FeedSettings, vars: &[(String, String)]) -> Self {
        let sources = if !clean_sources(&overrides.urls).is_empty() {
            clean_sources(&overrides.urls)
        } else if !clean_sources(&settings.sources).is_empty() {
            clean_sources(&settings.sources)
        } else {
            discover_sources(vars.iter().map(|(k, v)| (k, v)), &settings.prefixes())
        };

        let env_output = vars
            .iter()
            .find(|(k, _)| k == OUTPUT_ENV)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let output = overrides
            .output
            .clone()
            .or_else(|| settings.output.clone())
            .or(env_output)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

        let timeout_secs = overrides
            .timeout_secs
            .or(settings.timeout_secs)
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            sources,
            output,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
