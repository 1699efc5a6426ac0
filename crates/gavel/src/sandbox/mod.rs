//! Process sandbox
//!
//! The single place where processes are spawned. Every execution gets its own
//! [`Workspace`] (a scratch directory removed on every exit path), is fed its
//! stdin, has its output captured and is killed once its wall clock limit
//! passes.
//!
//! This is not a security boundary: no namespaces, seccomp or cgroups are
//! applied and the process sees the host filesystem and network.

use std::time::Duration;

use thiserror::Error;

pub use crate::sandbox::command::SandboxCommand;
pub use crate::sandbox::process::{ProcessOutput, run_process};
pub use crate::sandbox::workspace::Workspace;

mod command;
mod process;
mod workspace;

/// Errors that occur while running a sandboxed process
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("empty command")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process exceeded the {}s wall clock limit", limit.as_secs_f64())]
    TimedOut {
        limit: Duration,
        /// Output produced before the process was killed
        partial: Box<ProcessOutput>,
    },

    #[error("failed to create workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
