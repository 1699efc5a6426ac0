//! Submission records and grading outcomes

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verdict of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Created, not yet graded
    Pending,
    Accepted,
    WrongAnswer,
    RuntimeError,
    TimeLimitExceeded,
}

impl SubmissionStatus {
    /// Whether this is a final verdict
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::WrongAnswer => "wrong_answer",
            Self::RuntimeError => "runtime_error",
            Self::TimeLimitExceeded => "time_limit_exceeded",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input/expected-output pair of a problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: u64,
    pub input: String,
    pub expected_output: String,
    /// Hidden cases are graded like any other; only presentation differs
    #[serde(default)]
    pub hidden: bool,
}

/// Outcome of running one test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub test_case_id: u64,
    pub passed: bool,
    pub input: String,
    pub expected_output: String,
    /// Program stdout with surrounding whitespace removed
    pub actual_output: String,
    /// Diagnostics for failures other than a wrong answer
    pub error: Option<String>,
}

/// What the grading pipeline hands back
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub status: SubmissionStatus,
    pub test_results: Vec<TestCaseResult>,
    /// Longest run in seconds, only for accepted submissions
    pub runtime: Option<f64>,
    /// Peak memory in megabytes; not measured
    pub memory: Option<f64>,
}

impl GradeReport {
    pub fn passed_count(&self) -> usize {
        self.test_results.iter().filter(|r| r.passed).count()
    }
}

/// Inbound request to grade some code against a problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub user_id: String,
    pub problem_id: String,
    pub code: String,
    pub language: String,
}

/// A persisted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: String,
    pub problem_id: String,
    pub code: String,
    pub language: String,
    pub status: SubmissionStatus,
    pub runtime: Option<f64>,
    pub memory: Option<f64>,
    pub test_case_results: Vec<TestCaseResult>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// Create a pending submission with a fresh id
    pub fn new(request: SubmissionRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            problem_id: request.problem_id,
            code: request.code,
            language: request.language,
            status: SubmissionStatus::Pending,
            runtime: None,
            memory: None,
            test_case_results: Vec::new(),
            submitted_at: Utc::now(),
        }
    }

    /// Copy a grading outcome onto the record
    pub(crate) fn apply(&mut self, report: &GradeReport) {
        self.status = report.status;
        self.runtime = report.runtime;
        self.memory = report.memory;
        self.test_case_results = report.test_results.clone();
    }
}
