//! Grading submissions
//!
//! [`evaluate`] is the pure pipeline: code and test cases in, report out.
//! [`Grader`] wraps it with the submission lifecycle: records are created
//! pending, graded on their own task under a concurrency bound, and
//! finalized exactly once.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

pub use crate::grading::pipeline::{Decision, decide, evaluate};

mod pipeline;

use crate::problem::{ProblemError, ProblemSource};
use crate::runner::{Runner, RunnerError};
use crate::store::{StoreError, SubmissionStore};
use crate::submission::{GradeReport, Submission, SubmissionRequest};

#[derive(Debug, Error)]
pub enum GradeError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("problem error: {0}")]
    Problem(#[from] ProblemError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("runner error: {0}")]
    Runner(RunnerError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RunnerError> for GradeError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::UnsupportedLanguage(id) => Self::UnsupportedLanguage(id),
            other => Self::Runner(other),
        }
    }
}

/// Front door for grading submissions
#[derive(Debug)]
pub struct Grader {
    runner: Runner,
    problems: Arc<dyn ProblemSource>,
    store: Arc<dyn SubmissionStore>,
    permits: Arc<Semaphore>,
}

impl Grader {
    /// Create a grader allowing `max_concurrent_gradings` from the runner's config
    pub fn new(
        runner: Runner,
        problems: Arc<dyn ProblemSource>,
        store: Arc<dyn SubmissionStore>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(runner.config().max_concurrent_gradings));
        Self {
            runner,
            problems,
            store,
            permits,
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn store(&self) -> &Arc<dyn SubmissionStore> {
        &self.store
    }

    /// Gradings that could start right now
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Record a new pending submission
    ///
    /// An unknown language is rejected before anything is stored.
    #[instrument(skip(self, request), fields(user = %request.user_id, problem = %request.problem_id))]
    pub async fn submit(&self, request: SubmissionRequest) -> Result<Submission, GradeError> {
        self.runner.language(&request.language)?;
        Ok(self.store.create(Submission::new(request)).await?)
    }

    /// Grade a pending submission and record its verdict
    pub async fn grade(&self, submission: &Submission) -> Result<GradeReport, GradeError> {
        let (report, _) = self.grade_and_record(submission).await?;
        Ok(report)
    }

    /// Submit and grade in one call, returning the finalized record
    pub async fn submit_and_grade(
        &self,
        request: SubmissionRequest,
    ) -> Result<Submission, GradeError> {
        let submission = self.submit(request).await?;
        let (_, finalized) = self.grade_and_record(&submission).await?;
        Ok(finalized)
    }

    /// Grade in the background
    pub fn spawn_grade(
        self: Arc<Self>,
        submission: Submission,
    ) -> JoinHandle<Result<GradeReport, GradeError>> {
        tokio::spawn(async move { self.grade(&submission).await })
    }

    #[instrument(skip(self, submission), fields(id = %submission.id, language = %submission.language))]
    async fn grade_and_record(
        &self,
        submission: &Submission,
    ) -> Result<(GradeReport, Submission), GradeError> {
        // The caller's copy may be stale; the stored record decides
        let stored = self.store.get(submission.id).await?;
        if stored.status.is_terminal() {
            return Err(StoreError::AlreadyFinalized {
                id: stored.id,
                status: stored.status,
            }
            .into());
        }

        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| GradeError::Internal("grader is shut down".to_owned()))?;

        let runner = self.runner.clone();
        let problems = Arc::clone(&self.problems);
        let problem_id = submission.problem_id.clone();
        let language = submission.language.clone();
        let code = submission.code.clone();

        // A panic stays inside this task and the record stays pending
        let task = tokio::spawn(async move {
            let test_cases = problems.test_cases(&problem_id).await?;
            Ok::<_, GradeError>(evaluate(&runner, &language, &code, &test_cases).await?)
        });

        let report = match task.await {
            Ok(report) => report?,
            Err(e) => {
                let message = panic_message(e);
                error!(%message, "grading task failed");
                return Err(GradeError::Internal(message));
            }
        };

        let finalized = self.store.complete(submission.id, &report).await?;

        info!(
            status = %report.status,
            passed = report.passed_count(),
            runtime = ?report.runtime,
            "submission graded"
        );

        Ok((report, finalized))
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return format!("grading task cancelled: {err}");
    }
    let payload = err.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("grading panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("grading panicked: {message}")
    } else {
        "grading panicked".to_owned()
    }
}
