//! Judge configuration
//!
//! One [`Config`] is loaded at startup and shared read-only by everything
//! that runs code. It holds the language table, the default limits and the
//! grading concurrency bound.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::language::{CompileConfig, FileExtension, Language, Placeholders, RunConfig};
use crate::types::ExecutionLimits;

pub mod language;
mod loader;

/// The default configuration, embedded at compile time.
///
/// `gavel init` writes this out as a starting point.
pub const EXAMPLE_CONFIG: &str = include_str!("../../gavel.example.toml");

const DEFAULT_MAX_CONCURRENT_GRADINGS: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("file extension may not contain dots, slashes or whitespace")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language '{0}' not found in configuration")]
    LanguageNotFound(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Parent of the per-execution workspaces; the system temp dir if unset
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    #[serde(default = "default_max_concurrent_gradings")]
    pub max_concurrent_gradings: usize,

    /// Limits for languages that do not set their own
    #[serde(default)]
    pub default_limits: ExecutionLimits,

    /// Language table keyed by the ID submissions refer to
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// The embedded default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// No languages and built-in limits, for building a table by hand
    pub fn empty() -> Self {
        Self {
            work_dir: None,
            max_concurrent_gradings: DEFAULT_MAX_CONCURRENT_GRADINGS,
            default_limits: ExecutionLimits::default(),
            languages: HashMap::new(),
        }
    }

    pub fn with_language(mut self, id: impl Into<String>, language: Language) -> Self {
        self.languages.insert(id.into(), language);
        self
    }

    pub fn get_language(&self, id: &str) -> Result<&Language, ConfigError> {
        self.languages
            .get(id)
            .ok_or_else(|| ConfigError::LanguageNotFound(id.to_owned()))
    }

    pub fn work_root(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Limits for one language: its own values, then the defaults
    pub fn effective_limits(&self, language: &Language) -> ExecutionLimits {
        language
            .limits
            .as_ref()
            .map_or_else(|| self.default_limits.clone(), |own| {
                self.default_limits.with_overrides(own)
            })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_max_concurrent_gradings() -> usize {
    DEFAULT_MAX_CONCURRENT_GRADINGS
}
