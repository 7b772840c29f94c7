//! Process-wide configuration for critical-agent.
//!
//! Configuration is assembled once at startup from an optional YAML settings
//! file with environment variables layered on top. The resulting [`Config`] is
//! immutable and passed explicitly to every component that needs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::scan::DEFAULT_EXTENSIONS;

/// Environment variable holding the Groq API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";
/// Environment variable naming the base directory for name-based resolution.
pub const PROJECTS_ROOT_VAR: &str = "PROJECTS_ROOT";

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_LISTEN: &str = "127.0.0.1:5000";

/// Settings file names searched for in the working directory.
pub const DEFAULT_SETTINGS_NAMES: &[&str] = &["critical-agent.yaml", ".critical-agent.yaml"];

/// Errors that prevent the process from starting.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("GROQ_API_KEY not found in environment variables")]
    MissingApiKey,
    #[error("reading settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("temperature must be between 0.0 and 2.0, got {0}")]
    InvalidTemperature(f32),
    #[error("extension list must not be empty")]
    NoExtensions,
}

/// Optional settings read from a YAML file. Every key may be omitted.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    /// File name suffixes to scan, e.g. `.php`.
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Fallback for `PROJECTS_ROOT`; the environment wins when both are set.
    #[serde(default)]
    pub projects_root: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub listen: Option<String>,
}

impl Settings {
    /// Parse settings from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse_str(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is a valid, empty settings document.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Look for a settings file in the current directory.
    pub fn discover() -> Option<PathBuf> {
        DEFAULT_SETTINGS_NAMES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    }
}

/// Immutable runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub projects_root: Option<PathBuf>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub extensions: Vec<String>,
    pub request_timeout: Option<Duration>,
    pub output: Option<PathBuf>,
    pub listen: String,
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env(settings: Settings) -> Result<Self, ConfigError> {
        Self::from_lookup(settings, |key| std::env::var(key).ok())
    }

    /// Build the configuration using `lookup` to read environment variables.
    pub fn from_lookup<F>(settings: Settings, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_empty(API_KEY_VAR).ok_or(ConfigError::MissingApiKey)?;

        let projects_root = non_empty(PROJECTS_ROOT_VAR)
            .map(PathBuf::from)
            .or(settings.projects_root);

        let temperature = settings.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }

        let extensions = match settings.extensions {
            Some(list) => {
                let list: Vec<String> = list
                    .into_iter()
                    .map(|e| e.trim().to_string())
                    .filter(|e| !e.is_empty())
                    .collect();
                if list.is_empty() {
                    return Err(ConfigError::NoExtensions);
                }
                list
            }
            None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        };

        Ok(Self {
            api_key,
            projects_root,
            model: settings.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: settings
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            temperature,
            extensions,
            request_timeout: settings.request_timeout_secs.map(Duration::from_secs),
            output: settings.output,
            listen: settings.listen.unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("projects_root", &self.projects_root)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("extensions", &self.extensions)
            .field("request_timeout", &self.request_timeout)
            .field("output", &self.output)
            .field("listen", &self.listen)
            .finish()
    }
}
