//! Code runner for Gavel
//!
//! Provides high-level APIs for compiling and executing code in scratch
//! workspaces.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

pub use crate::runner::compile::{CompileResult, compile};
pub use crate::runner::execute::{execute, write_source};

mod compile;
mod execute;

use crate::{
    config::{Config, Language},
    sandbox::{SandboxError, Workspace},
    types::ExecutionResult,
};

/// Errors raised before any program is started
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("workspace error: {0}")]
    Workspace(#[from] SandboxError),
}

/// High-level runner for code execution
///
/// Cheap to clone; the language table is shared read-only.
#[derive(Debug, Clone)]
pub struct Runner {
    config: Arc<Config>,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Create a runner sharing an existing configuration
    pub fn from_shared(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self::new(Config::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a language ID against the table
    pub fn language(&self, language_id: &str) -> Result<&Language, RunnerError> {
        self.config
            .get_language(language_id)
            .map_err(|_| RunnerError::UnsupportedLanguage(language_id.to_owned()))
    }

    /// Write and compile source code in a caller-managed workspace
    pub async fn compile(
        &self,
        workspace: &Workspace,
        language_id: &str,
        source: &[u8],
    ) -> Result<CompileResult, RunnerError> {
        let language = self.language(language_id)?;
        Ok(compile::compile(workspace, &self.config, language, source).await)
    }

    /// Run a program already prepared in a caller-managed workspace
    pub async fn run(
        &self,
        workspace: &Workspace,
        language_id: &str,
        input: &[u8],
    ) -> Result<ExecutionResult, RunnerError> {
        let language = self.language(language_id)?;
        Ok(execute::execute(workspace, &self.config, language, input).await)
    }

    /// Set up a program for repeated runs
    ///
    /// The source is written into a fresh workspace and compiled if the
    /// language needs it. A failed compile is kept in the returned program
    /// rather than raised.
    #[instrument(skip(self, source), fields(source_len = source.len()))]
    pub async fn prepare(
        &self,
        language_id: &str,
        source: &[u8],
    ) -> Result<PreparedProgram, RunnerError> {
        let language = self.language(language_id)?.clone();
        let workspace = Workspace::open(self.config.work_root()).await?;

        let compiled = compile::compile(&workspace, &self.config, &language, source).await;
        let failure = if compiled.is_success() {
            None
        } else {
            debug!(status = ?compiled.execution.status, "program could not be prepared");
            Some(compiled.execution)
        };

        Ok(PreparedProgram {
            config: Arc::clone(&self.config),
            language,
            workspace: Some(workspace),
            failure,
        })
    }

    /// Compile if needed and run once against `stdin`
    ///
    /// Nothing is left on disk once this returns.
    pub async fn execute(
        &self,
        language_id: &str,
        source: &[u8],
        stdin: &[u8],
    ) -> Result<ExecutionResult, RunnerError> {
        let program = self.prepare(language_id, source).await?;
        let result = program.run(stdin).await;
        program.finish();
        Ok(result)
    }
}

/// A program written (and compiled) into its own workspace
///
/// The workspace is removed by [`finish()`](Self::finish) or on drop.
#[derive(Debug)]
pub struct PreparedProgram {
    config: Arc<Config>,
    language: Language,
    workspace: Option<Workspace>,
    failure: Option<ExecutionResult>,
}

impl PreparedProgram {
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The failed compile, if the program could not be built
    pub fn compile_failure(&self) -> Option<&ExecutionResult> {
        self.failure.as_ref()
    }

    /// Run the program against one input
    ///
    /// A program that failed to build reports its compile failure every time.
    pub async fn run(&self, input: &[u8]) -> ExecutionResult {
        if let Some(ref failure) = self.failure {
            return failure.clone();
        }
        match self.workspace {
            Some(ref workspace) => {
                execute::execute(workspace, &self.config, &self.language, input).await
            }
            None => ExecutionResult::sandbox_error("workspace already removed"),
        }
    }

    /// Remove the workspace
    pub fn finish(mut self) {
        if let Some(workspace) = self.workspace.take() {
            workspace.cleanup();
        }
    }
}
