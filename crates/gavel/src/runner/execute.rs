//! Execution step for code running
//!
//! Handles running compiled or interpreted programs with input/output.

use tracing::{debug, instrument};

use crate::config::{Config, Language, Placeholders};
use crate::sandbox::{ProcessOutput, SandboxCommand, SandboxError, Workspace, run_process};
use crate::types::{ExecutionResult, ExecutionStatus};

/// Absolute paths a command template is expanded with
pub(crate) struct ProgramPaths {
    pub source: String,
    pub binary: String,
    pub dir: String,
}

impl ProgramPaths {
    pub(crate) fn resolve(workspace: &Workspace, language: &Language) -> Result<Self, SandboxError> {
        let source = workspace.file_path(&language.source_name())?;
        let binary = workspace.file_path(&language.artifact_name())?;
        Ok(Self {
            source: source.to_string_lossy().into_owned(),
            binary: binary.to_string_lossy().into_owned(),
            dir: workspace.path().to_string_lossy().into_owned(),
        })
    }

    pub(crate) fn expand(&self, command: &[String]) -> Vec<String> {
        Placeholders {
            source: &self.source,
            binary: &self.binary,
            dir: &self.dir,
        }
        .expand(command)
    }
}

/// Write the program source into the workspace under the language's file name
pub async fn write_source(
    workspace: &Workspace,
    language: &Language,
    source: &[u8],
) -> Result<(), SandboxError> {
    let source_name = language.source_name();
    workspace.write_file(&source_name, source).await?;
    debug!(source_name, "wrote source file");
    Ok(())
}

/// Execute a program that is already in the workspace
///
/// Interpreted languages need their source written first; compiled languages
/// need a successful compile. Every failure is reported in the result.
#[instrument(skip(workspace, config, language, input), fields(language = %language.name))]
pub async fn execute(
    workspace: &Workspace,
    config: &Config,
    language: &Language,
    input: &[u8],
) -> ExecutionResult {
    let limits = config.effective_limits(language);

    let paths = match ProgramPaths::resolve(workspace, language) {
        Ok(paths) => paths,
        Err(e) => return ExecutionResult::sandbox_error(e.to_string()),
    };

    let artifact = language.artifact_name();
    match workspace.file_exists(&artifact).await {
        Ok(true) => {}
        Ok(false) => {
            let hint = if language.is_compiled() {
                "was compilation run?"
            } else {
                "write source first"
            };
            return ExecutionResult::sandbox_error(format!(
                "'{artifact}' not found in workspace - {hint}"
            ));
        }
        Err(e) => return ExecutionResult::sandbox_error(e.to_string()),
    }

    let run_cmd = paths.expand(&language.run.command);
    debug!(?run_cmd, "executing program");

    let command = SandboxCommand::new(run_cmd)
        .envs(&language.run.env)
        .working_dir(workspace.path())
        .stdin(input)
        .timeout(limits.run_duration())
        .max_output(limits.max_output_bytes());

    let result = into_execution_result(run_process(command).await);

    debug!(
        status = ?result.status,
        wall_time = result.wall_time,
        exit_code = ?result.exit_code,
        "execution complete"
    );

    result
}

/// Fold a sandbox outcome into an execution result
pub(crate) fn into_execution_result(outcome: Result<ProcessOutput, SandboxError>) -> ExecutionResult {
    match outcome {
        Ok(output) => {
            let status = if output.is_success() {
                ExecutionStatus::Ok
            } else {
                ExecutionStatus::RuntimeError
            };
            ExecutionResult {
                status,
                exit_code: output.exit_code,
                signal: output.signal,
                stdout: output.stdout_lossy(),
                stderr: output.stderr_lossy(),
                message: None,
                wall_time: output.wall_time.as_secs_f64(),
                truncated: output.truncated,
            }
        }
        Err(SandboxError::TimedOut { limit, partial }) => ExecutionResult {
            status: ExecutionStatus::TimeLimitExceeded,
            exit_code: None,
            signal: None,
            stdout: partial.stdout_lossy(),
            stderr: partial.stderr_lossy(),
            message: Some(format!(
                "wall clock limit of {}s exceeded",
                limit.as_secs_f64()
            )),
            wall_time: partial.wall_time.as_secs_f64(),
            truncated: partial.truncated,
        },
        Err(e) => ExecutionResult::sandbox_error(e.to_string()),
    }
}
