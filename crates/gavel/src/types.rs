use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLimits {
    /// Wall clock limit for running the program, in seconds
    #[serde(default)]
    pub run_timeout: Option<f64>,

    /// Wall clock limit for the compile step, in seconds
    #[serde(default)]
    pub compile_timeout: Option<f64>,

    /// Maximum captured size of each of stdout and stderr, in kilobytes
    #[serde(default)]
    pub max_output: Option<u64>,
}

impl ExecutionLimits {
    /// Fallback run timeout when neither defaults nor language set one
    pub const DEFAULT_RUN_TIMEOUT: f64 = 10.0;

    /// Fallback compile timeout when neither defaults nor language set one
    pub const DEFAULT_COMPILE_TIMEOUT: f64 = 30.0;

    /// Fallback output cap in kilobytes (64 MB)
    pub const DEFAULT_MAX_OUTPUT: u64 = 64 * 1024;

    /// Create limits with all fields unset
    pub fn unset() -> Self {
        Self {
            run_timeout: None,
            compile_timeout: None,
            max_output: None,
        }
    }

    /// Set the run timeout in seconds
    pub fn with_run_timeout(mut self, seconds: f64) -> Self {
        self.run_timeout = Some(seconds);
        self
    }

    /// Set the compile timeout in seconds
    pub fn with_compile_timeout(mut self, seconds: f64) -> Self {
        self.compile_timeout = Some(seconds);
        self
    }

    /// Set the output cap in kilobytes
    pub fn with_max_output(mut self, kb: u64) -> Self {
        self.max_output = Some(kb);
        self
    }

    /// Field-wise merge where anything set in `overrides` wins
    pub fn with_overrides(&self, overrides: &ExecutionLimits) -> ExecutionLimits {
        ExecutionLimits {
            run_timeout: overrides.run_timeout.or(self.run_timeout),
            compile_timeout: overrides.compile_timeout.or(self.compile_timeout),
            max_output: overrides.max_output.or(self.max_output),
        }
    }

    /// A timeout in seconds as a `Duration`, if it is positive and fits
    pub fn timeout_from_secs(seconds: f64) -> Option<Duration> {
        Duration::try_from_secs_f64(seconds)
            .ok()
            .filter(|duration| !duration.is_zero())
    }

    pub fn run_duration(&self) -> Duration {
        clamped(self.run_timeout.unwrap_or(Self::DEFAULT_RUN_TIMEOUT))
    }

    pub fn compile_duration(&self) -> Duration {
        clamped(
            self.compile_timeout
                .unwrap_or(Self::DEFAULT_COMPILE_TIMEOUT),
        )
    }

    /// Output cap in bytes
    pub fn max_output_bytes(&self) -> usize {
        let kb = self.max_output.unwrap_or(Self::DEFAULT_MAX_OUTPUT);
        usize::try_from(kb.saturating_mul(1024)).unwrap_or(usize::MAX)
    }
}

/// Out-of-range seconds saturate instead of panicking; NaN and negatives are zero
fn clamped(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds).unwrap_or(if seconds > 0.0 {
        Duration::MAX
    } else {
        Duration::ZERO
    })
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            run_timeout: Some(Self::DEFAULT_RUN_TIMEOUT),
            compile_timeout: Some(Self::DEFAULT_COMPILE_TIMEOUT),
            max_output: Some(Self::DEFAULT_MAX_OUTPUT),
        }
    }
}

/// Result of one program execution (or of a failed compile that prevented it)
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,

    /// `None` when the process was killed or never started
    pub exit_code: Option<i32>,

    /// Terminating signal, Unix only
    pub signal: Option<i32>,

    pub stdout: String,

    /// Standard error, or compiler diagnostics for [`ExecutionStatus::CompileError`]
    pub stderr: String,

    /// Sandbox-level message when the process could not be run at all
    pub message: Option<String>,

    /// Seconds from spawn to exit
    pub wall_time: f64,

    /// Whether stdout or stderr hit the output cap
    pub truncated: bool,
}

impl ExecutionResult {
    /// Ran to completion with exit code 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, ExecutionStatus::Ok) && self.exit_code == Some(0)
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        matches!(self.status, ExecutionStatus::TimeLimitExceeded)
    }

    /// The process failed: it crashed, exited non-zero, failed to build or
    /// could not be started.
    #[must_use]
    pub fn errored(&self) -> bool {
        match self.status {
            ExecutionStatus::Ok => self.exit_code != Some(0),
            ExecutionStatus::TimeLimitExceeded => false,
            ExecutionStatus::RuntimeError
            | ExecutionStatus::CompileError
            | ExecutionStatus::SandboxError => true,
        }
    }

    /// Result for a process that never started
    pub fn sandbox_error(message: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::SandboxError,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Best human-readable description of why the execution failed
    pub fn error_text(&self) -> Option<String> {
        if !self.errored() && !self.timed_out() {
            return None;
        }
        if self.timed_out() {
            return Some("Time limit exceeded".to_owned());
        }
        if !self.stderr.trim().is_empty() {
            return Some(self.stderr.clone());
        }
        if let Some(ref message) = self.message {
            return Some(message.clone());
        }
        Some(match (self.exit_code, self.signal) {
            (_, Some(signal)) => format!("killed by signal {signal}"),
            (Some(code), None) => format!("exited with code {code}"),
            (None, None) => "process failed".to_owned(),
        })
    }
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self {
            status: ExecutionStatus::Ok,
            exit_code: None,
            signal: None,
            stdout: String::new(),
            stderr: String::new(),
            message: None,
            wall_time: 0.0,
            truncated: false,
        }
    }
}

/// How a single execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Process exited on its own; check `exit_code`
    Ok,

    /// Non-zero exit code or killed by a signal
    RuntimeError,

    /// Wall clock limit exceeded; the process was killed
    TimeLimitExceeded,

    /// The compile step failed or timed out; nothing was run
    CompileError,

    /// The process could not be started
    SandboxError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fully_populated() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.run_timeout, Some(10.0));
        assert_eq!(limits.compile_timeout, Some(30.0));
        assert!(limits.max_output.is_some());
    }

    #[test]
    fn builders_set_each_field() {
        let limits = ExecutionLimits::unset()
            .with_run_timeout(2.0)
            .with_compile_timeout(5.0)
            .with_max_output(16);

        assert_eq!(limits.run_timeout, Some(2.0));
        assert_eq!(limits.compile_timeout, Some(5.0));
        assert_eq!(limits.max_output, Some(16));
        assert_eq!(limits.max_output_bytes(), 16 * 1024);
    }

    #[test]
    fn merging_nothing_changes_nothing() {
        let base = ExecutionLimits::default();
        let result = base.with_overrides(&ExecutionLimits::unset());
        assert_eq!(result, base);
    }

    #[test]
    fn merge_only_replaces_set_fields() {
        let base = ExecutionLimits::default();
        let overrides = ExecutionLimits::unset().with_run_timeout(2.0);

        let result = base.with_overrides(&overrides);
        assert_eq!(result.run_timeout, Some(2.0));
        assert_eq!(result.compile_timeout, base.compile_timeout);
        assert_eq!(result.max_output, base.max_output);
    }

    #[test]
    fn unset_limits_fall_back_to_builtin_durations() {
        let limits = ExecutionLimits::unset();
        assert_eq!(limits.run_duration(), Duration::from_secs(10));
        assert_eq!(limits.compile_duration(), Duration::from_secs(30));
        assert_eq!(limits.max_output_bytes(), 64 * 1024 * 1024);
    }

    #[test]
    fn fractional_timeouts_convert() {
        let limits = ExecutionLimits::unset().with_run_timeout(0.5);
        assert_eq!(limits.run_duration(), Duration::from_millis(500));
    }

    #[test]
    fn huge_or_invalid_timeouts_do_not_panic() {
        let huge = ExecutionLimits::unset().with_run_timeout(1e300);
        assert_eq!(huge.run_duration(), Duration::MAX);

        let negative = ExecutionLimits::unset().with_compile_timeout(-1.0);
        assert_eq!(negative.compile_duration(), Duration::ZERO);

        let nan = ExecutionLimits::unset().with_run_timeout(f64::NAN);
        assert_eq!(nan.run_duration(), Duration::ZERO);
    }

    #[test]
    fn timeout_from_secs_accepts_only_usable_values() {
        assert_eq!(
            ExecutionLimits::timeout_from_secs(2.5),
            Some(Duration::from_millis(2500))
        );
        for bad in [0.0, -1.0, 1e300, f64::NAN, f64::INFINITY, 1e-12] {
            assert_eq!(ExecutionLimits::timeout_from_secs(bad), None, "{bad}");
        }
    }

    #[test]
    fn is_success_requires_zero_exit() {
        let ok = ExecutionResult {
            exit_code: Some(0),
            ..Default::default()
        };
        let nonzero = ExecutionResult {
            exit_code: Some(1),
            ..Default::default()
        };
        assert!(ok.is_success());
        assert!(!ok.errored());
        assert!(!nonzero.is_success());
        assert!(nonzero.errored());
    }

    #[test]
    fn timeout_is_not_an_error() {
        let result = ExecutionResult {
            status: ExecutionStatus::TimeLimitExceeded,
            ..Default::default()
        };
        assert!(result.timed_out());
        assert!(!result.errored());
        assert_eq!(result.error_text().as_deref(), Some("Time limit exceeded"));
    }

    #[test]
    fn sandbox_error_carries_message() {
        let result = ExecutionResult::sandbox_error("failed to spawn 'python3'");
        assert!(result.errored());
        assert_eq!(
            result.error_text().as_deref(),
            Some("failed to spawn 'python3'")
        );
    }

    #[test]
    fn error_text_prefers_stderr() {
        let result = ExecutionResult {
            status: ExecutionStatus::RuntimeError,
            exit_code: Some(1),
            stderr: "Traceback: boom".to_owned(),
            ..Default::default()
        };
        assert_eq!(result.error_text().as_deref(), Some("Traceback: boom"));
    }

    #[test]
    fn error_text_falls_back_to_exit_code_and_signal() {
        let exited = ExecutionResult {
            status: ExecutionStatus::RuntimeError,
            exit_code: Some(3),
            ..Default::default()
        };
        let signaled = ExecutionResult {
            status: ExecutionStatus::RuntimeError,
            signal: Some(11),
            ..Default::default()
        };
        assert_eq!(exited.error_text().as_deref(), Some("exited with code 3"));
        assert_eq!(signaled.error_text().as_deref(), Some("killed by signal 11"));
    }

    #[test]
    fn error_text_none_on_success() {
        let result = ExecutionResult {
            exit_code: Some(0),
            stderr: "warning: something".to_owned(),
            ..Default::default()
        };
        assert!(result.error_text().is_none());
    }

    #[test]
    fn execution_status_serializes_snake_case() {
        let json = serde_json::to_string(&ExecutionStatus::TimeLimitExceeded).unwrap();
        assert_eq!(json, "\"time_limit_exceeded\"");
    }
}
