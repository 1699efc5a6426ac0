use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;
use crate::types::ExecutionLimits;

/// One entry of the language table
///
/// Adding a language to the judge means adding one of these; nothing else
/// in the pipeline is language specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    /// Display name, e.g. "Python 3"
    pub name: String,

    /// Source file extension
    pub extension: FileExtension,

    /// Build step; absent for interpreted languages
    #[serde(default)]
    pub compile: Option<CompileConfig>,

    pub run: RunConfig,

    /// Timeouts and output cap for this language (overrides defaults)
    #[serde(default)]
    pub limits: Option<ExecutionLimits>,
}

impl Language {
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Name the submitted source is saved under
    pub fn source_name(&self) -> String {
        match self.compile {
            Some(ref compile) => compile.source_name.clone(),
            None => format!("main.{}", self.extension),
        }
    }

    /// File the run step needs: the build output, or the source itself
    pub fn artifact_name(&self) -> String {
        match self.compile {
            Some(ref compile) => compile.output_name.clone(),
            None => self.source_name(),
        }
    }
}

/// Values substituted into command templates
///
/// `{source}` is the source file, `{output}` and `{binary}` both name the
/// build output and `{dir}` the workspace holding them. Anything else in
/// braces is left alone.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub source: &'a str,
    pub binary: &'a str,
    pub dir: &'a str,
}

impl Placeholders<'_> {
    pub fn expand(&self, template: &[String]) -> Vec<String> {
        template.iter().map(|arg| self.expand_arg(arg)).collect()
    }

    /// Substitute in one pass, so a value that itself contains `{dir}` is
    /// not expanded again
    fn expand_arg(&self, arg: &str) -> String {
        let mut out = String::with_capacity(arg.len());
        let mut rest = arg;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = [
                ("{source}", self.source),
                ("{output}", self.binary),
                ("{binary}", self.binary),
                ("{dir}", self.dir),
            ]
            .into_iter()
            .find(|(name, _)| tail.starts_with(name));
            match value {
                Some((name, value)) => {
                    out.push_str(value);
                    rest = &tail[name.len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// File extension without the dot, e.g. "cpp"
#[derive(Debug, Clone, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    pub fn new(extension: &str) -> Result<Self, ConfigError> {
        if extension
            .chars()
            .any(|c| c == '/' || c == '.' || c.is_whitespace())
        {
            return Err(ConfigError::InvalidFileExtChars);
        }
        Ok(Self(extension.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FileExtension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        FileExtension::new(&raw).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&raw),
                &"an extension without dots, slashes or whitespace",
            )
        })
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build step of a compiled language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Compiler invocation; a non-zero exit means the submission does not build
    pub command: Vec<String>,

    /// Source file name in the workspace, e.g. "Main.java"
    pub source_name: String,

    /// What the compiler produces, checked for before every run
    pub output_name: String,

    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Run step, executed once per test case with the case input on stdin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub command: Vec<String>,

    #[serde(default)]
    pub env: HashMap<String, String>,
}
