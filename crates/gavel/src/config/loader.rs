//! Reading configuration from TOML and the environment

use std::path::Path;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};

use crate::config::{Config, ConfigError, Language};
use crate::types::ExecutionLimits;

/// Prefix for environment overrides, e.g. `GAVEL_MAX_CONCURRENT_GRADINGS=8`.
/// Nested keys use a double underscore: `GAVEL_DEFAULT_LIMITS__RUN_TIMEOUT=5`.
const ENV_PREFIX: &str = "GAVEL";

impl Config {
    /// Load a config file, letting `GAVEL_*` variables override its values
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        finish(builder)
    }

    /// Parse a TOML document; the environment is not consulted
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        finish(config::Config::builder().add_source(File::from_str(content, FileFormat::Toml)))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_gradings == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_gradings must be at least 1".to_owned(),
            ));
        }
        check_limits("default_limits", &self.default_limits)?;
        self.languages
            .iter()
            .try_for_each(|(id, language)| check_language(id, language))
    }
}

fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let config: Config = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

fn check_language(id: &str, language: &Language) -> Result<(), ConfigError> {
    let problem = if language.name.trim().is_empty() {
        Some("name is empty")
    } else if language.extension.is_empty() {
        Some("extension is empty")
    } else if language.run.command.is_empty() {
        Some("run command is empty")
    } else if language
        .compile
        .as_ref()
        .is_some_and(|compile| compile.command.is_empty())
    {
        Some("compile command is empty")
    } else if language
        .compile
        .as_ref()
        .is_some_and(|compile| compile.output_name.is_empty() || compile.source_name.is_empty())
    {
        Some("compile step needs source_name and output_name")
    } else {
        None
    };

    if let Some(problem) = problem {
        return Err(ConfigError::Invalid(format!("language '{id}': {problem}")));
    }
    match language.limits {
        Some(ref limits) => check_limits(&format!("language '{id}'"), limits),
        None => Ok(()),
    }
}

fn check_limits(owner: &str, limits: &ExecutionLimits) -> Result<(), ConfigError> {
    for (field, value) in [
        ("run_timeout", limits.run_timeout),
        ("compile_timeout", limits.compile_timeout),
    ] {
        if let Some(seconds) = value
            && ExecutionLimits::timeout_from_secs(seconds).is_none()
        {
            return Err(ConfigError::Invalid(format!(
                "{owner}: {field} must be a positive number of seconds, got {seconds}"
            )));
        }
    }
    Ok(())
}
