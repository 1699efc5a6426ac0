//! Command builder for sandboxed processes

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::sandbox::SandboxError;
use crate::types::ExecutionLimits;

/// Builder describing one process to run
#[derive(Debug, Clone)]
pub struct SandboxCommand {
    /// Program followed by its arguments
    argv: Vec<String>,
    env: HashMap<String, String>,
    working_dir: Option<PathBuf>,
    stdin: Vec<u8>,
    timeout: Duration,
    /// Bytes kept of each of stdout and stderr
    max_output: usize,
}

impl SandboxCommand {
    /// Create a new command from a program and its arguments
    pub fn new(argv: Vec<String>) -> Self {
        let limits = ExecutionLimits::default();
        Self {
            argv,
            env: HashMap::new(),
            working_dir: None,
            stdin: Vec::new(),
            timeout: limits.run_duration(),
            max_output: limits.max_output_bytes(),
        }
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set several environment variables
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the data written to the process stdin
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = data.into();
        self
    }

    /// Set the wall clock limit
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the number of bytes kept of each output stream
    pub fn max_output(mut self, bytes: usize) -> Self {
        self.max_output = bytes;
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn stdin_data(&self) -> &[u8] {
        &self.stdin
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    pub fn max_output_bytes(&self) -> usize {
        self.max_output
    }

    /// Build the tokio command with piped stdio
    ///
    /// The child leads a new process group so everything it spawns can be
    /// killed together. It is also killed if its handle is dropped before it
    /// is reaped.
    pub fn build(&self) -> Result<Command, SandboxError> {
        let (program, args) = self.argv.split_first().ok_or(SandboxError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }

        Ok(command)
    }
}
