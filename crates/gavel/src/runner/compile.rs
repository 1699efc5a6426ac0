//! Compilation step for code execution
//!
//! Handles compiling source code using language-specific compilers.

use tracing::{debug, instrument};

use crate::config::{Config, Language};
use crate::runner::execute::{ProgramPaths, into_execution_result, write_source};
use crate::sandbox::{SandboxCommand, Workspace, run_process};
use crate::types::{ExecutionResult, ExecutionStatus};

/// Result of a compilation
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// Whether compilation succeeded
    pub success: bool,

    /// Execution result from the compilation process
    ///
    /// On failure its status is [`ExecutionStatus::CompileError`] (or
    /// [`ExecutionStatus::SandboxError`] if the compiler could not be started)
    /// and `stderr` holds the diagnostics.
    pub execution: ExecutionResult,

    /// Compiler output (stdout and stderr combined)
    pub output: String,
}

impl CompileResult {
    /// Check if compilation was successful
    pub fn is_success(&self) -> bool {
        self.success && self.execution.exit_code == Some(0)
    }

    fn failed(execution: ExecutionResult) -> Self {
        let output = execution.error_text().unwrap_or_default();
        Self {
            success: false,
            execution,
            output,
        }
    }
}

/// Write the source into the workspace and compile it
///
/// Interpreted languages only get their source written and report success.
#[instrument(skip(workspace, config, language, source), fields(language = %language.name))]
pub async fn compile(
    workspace: &Workspace,
    config: &Config,
    language: &Language,
    source: &[u8],
) -> CompileResult {
    if let Err(e) = write_source(workspace, language, source).await {
        return CompileResult::failed(ExecutionResult::sandbox_error(format!(
            "failed to write source: {e}"
        )));
    }

    let Some(ref compile_config) = language.compile else {
        return CompileResult {
            success: true,
            execution: ExecutionResult {
                exit_code: Some(0),
                ..Default::default()
            },
            output: String::new(),
        };
    };

    let limits = config.effective_limits(language);
    let paths = match ProgramPaths::resolve(workspace, language) {
        Ok(paths) => paths,
        Err(e) => return CompileResult::failed(ExecutionResult::sandbox_error(e.to_string())),
    };

    let compile_cmd = paths.expand(&compile_config.command);
    debug!(?compile_cmd, "compiling");

    let command = SandboxCommand::new(compile_cmd)
        .envs(&compile_config.env)
        .working_dir(workspace.path())
        .timeout(limits.compile_duration())
        .max_output(limits.max_output_bytes());

    let mut execution = into_execution_result(run_process(command).await);

    // Combine stdout and stderr for compiler output
    let mut output = execution.stdout.clone();
    if !output.is_empty() && !execution.stderr.is_empty() {
        output.push('\n');
    }
    output.push_str(&execution.stderr);

    let success = execution.is_success();

    match execution.status {
        ExecutionStatus::Ok if success => {}
        ExecutionStatus::SandboxError => {}
        ExecutionStatus::TimeLimitExceeded => {
            let message = format!(
                "compilation timed out after {}s",
                limits.compile_duration().as_secs_f64()
            );
            execution.status = ExecutionStatus::CompileError;
            if output.trim().is_empty() {
                output = message.clone();
            }
            execution.message = Some(message);
        }
        _ => {
            execution.status = ExecutionStatus::CompileError;
            if output.trim().is_empty() {
                output = format!(
                    "compiler exited with {}",
                    match execution.exit_code {
                        Some(code) => format!("code {code}"),
                        None => "a signal".to_owned(),
                    }
                );
            }
        }
    }

    if !success {
        // Diagnostics live in stderr so downstream error reporting finds them
        if execution.status == ExecutionStatus::CompileError {
            execution.stderr = output.clone();
        } else if output.is_empty() {
            output = execution.error_text().unwrap_or_default();
        }
    }

    debug!(
        success,
        exit_code = ?execution.exit_code,
        status = ?execution.status,
        "compilation complete"
    );

    CompileResult {
        success,
        execution,
        output,
    }
}
