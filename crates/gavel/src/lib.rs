//! A library for compiling, running and grading submitted code.
//!
//! Gavel is the execution core of an online judge. It takes a submission's
//! source code and language, runs it against a problem's test cases and
//! produces a verdict (`accepted`, `wrong_answer`, `runtime_error` or
//! `time_limit_exceeded`) with per-test-case detail.
//!
//! # Features
//!
//! - **Multi-language**: compiled and interpreted languages from a TOML table.
//! - **Scratch workspaces**: every execution gets its own directory, removed on every exit path.
//! - **Wall clock limits**: programs are killed once their timeout passes.
//! - **Short-circuit grading**: test cases run in order and stop at the first failure.
//! - **Submission records**: pending records finalized exactly once through a store trait.
//!
//! Programs are not isolated from the host. Run untrusted code only inside an
//! external sandbox such as a container.

pub use compare::{normalize_output, outputs_match};
pub use config::{Config, ConfigError, EXAMPLE_CONFIG, Language};
pub use grading::{GradeError, Grader, evaluate};
pub use problem::{InMemoryProblemSet, ProblemError, ProblemFile, ProblemSource};
pub use runner::{CompileResult, PreparedProgram, Runner, RunnerError};
pub use sandbox::{SandboxError, Workspace};
pub use store::{InMemorySubmissionStore, StoreError, SubmissionStore};
pub use submission::{
    GradeReport, Submission, SubmissionRequest, SubmissionStatus, TestCase, TestCaseResult,
};
pub use types::{ExecutionLimits, ExecutionResult, ExecutionStatus};

pub mod compare;
pub mod config;
pub mod grading;
pub mod problem;
pub mod runner;
pub mod sandbox;
pub mod store;
pub mod submission;
pub mod types;

#[cfg(test)]
mod testing;
