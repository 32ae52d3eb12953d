//! Service configuration
//!
//! One TOML file, every field defaulted. Located through
//! [`paths::resolve_config`]; a missing file yields the defaults.
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:5000"
//! base_url = "https://kwalitee.example.org"
//!
//! [hosting]
//! context = "kwalitee"
//!
//! [message]
//! components = ["search", "global"]
//! trusted = ["example.org"]
//!
//! [checks]
//! excludes = ["docs/"]
//!
//! [[analyzers]]
//! name = "flake8"
//! command = ["flake8", "{path}"]
//! extensions = ["py"]
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::services::{CheckOptions, MessageOptions};
use crate::paths;

/// Environment variable overriding `hosting.access_token`
pub const TOKEN_ENV: &str = "KWALITEE_ACCESS_TOKEN";

/// Sections a per-repository file may override
const OVERRIDABLE: [&str; 2] = ["message", "checks"];

/// Configuration failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// I/O error
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for the schema
    #[error("invalid configuration in {origin}: {message}")]
    Parse {
        /// Where the text came from
        origin: String,
        /// Decoder message
        message: String,
    },
}

/// Complete kwalitee configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP service and worker pool
    pub server: ServerConfig,
    /// Code-hosting API
    pub hosting: HostingConfig,
    /// Commit message rules
    pub message: MessageOptions,
    /// Check switches and filters
    pub checks: CheckOptions,
    /// Pull request labels
    pub labels: LabelConfig,
    /// External analyzers
    pub analyzers: Vec<AnalyzerConfig>,
}

/// `[server]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Public URL of this service, used in status links
    pub base_url: String,
    /// Worker threads
    pub workers: usize,
    /// SQLite database path
    pub database: Option<PathBuf>,
    /// Wall-clock limit of one job; an analyzer still running past it is killed
    pub worker_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
            base_url: "http://127.0.0.1:5000".to_string(),
            workers: 2,
            database: None,
            worker_timeout_secs: 180,
        }
    }
}

impl ServerConfig {
    /// `worker_timeout_secs` as a duration
    #[must_use]
    pub const fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    /// Database path, defaulting to the data directory
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(paths::default_database)
    }
}

/// `[hosting]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingConfig {
    /// API root
    pub api_url: String,
    /// Token used when the account has none
    pub access_token: Option<String>,
    /// Status context
    pub context: String,
    /// Register unknown repositories on their first webhook
    pub auto_create: bool,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            access_token: None,
            context: "kwalitee".to_string(),
            auto_create: false,
        }
    }
}

/// `[labels]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Work in progress
    pub wip: String,
    /// Needs work after review
    pub review: String,
    /// Clean, ready for integration
    pub ready: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            wip: "in_work".to_string(),
            review: "in_review".to_string(),
            ready: "in_integration".to_string(),
        }
    }
}

impl LabelConfig {
    /// The three managed labels
    #[must_use]
    pub fn managed(&self) -> [&str; 3] {
        [&self.wip, &self.review, &self.ready]
    }
}

/// One `[[analyzers]]` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Display name
    pub name: String,
    /// Program and arguments; `{path}` is replaced by the file path,
    /// which is appended when no argument contains it
    pub command: Vec<String>,
    /// Handled file extensions, without the dot
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl Config {
    /// Parse configuration text
    pub fn parse(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `path`, defaults when the file does not exist
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text, &path.display().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Resolve the location, load and apply environment overrides
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = paths::resolve_config(explicit);
        log::debug!("Loading configuration from {}", path.display());
        let config = Self::load_file(&path)?;
        Ok(config.with_token_override(std::env::var(TOKEN_ENV).ok()))
    }

    /// Replace the access token when `token` is non-empty
    #[must_use]
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.hosting.access_token = Some(token);
        }
        self
    }

    /// Apply a per-repository override file
    ///
    /// Keys of `[message]` and `[checks]` in `text` replace the matching
    /// keys of this configuration; every other section is ignored.
    pub fn with_repo_overrides(&self, text: &str, origin: &str) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            origin: origin.to_string(),
            message,
        };
        let overrides: toml::Table = toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
        let toml::Value::Table(mut base) =
            toml::Value::try_from(self).map_err(|e| parse_error(e.to_string()))?
        else {
            return Ok(self.clone());
        };

        for section in OVERRIDABLE {
            let Some(toml::Value::Table(keys)) = overrides.get(section) else {
                continue;
            };
            if let Some(toml::Value::Table(target)) = base.get_mut(section) {
                for (key, value) in keys {
                    target.insert(key.clone(), value.clone());
                }
            }
        }

        toml::Value::Table(base).try_into().map_err(|e: toml::de::Error| parse_error(e.to_string()))
    }
}
