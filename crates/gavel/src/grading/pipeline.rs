//! Test case loop and verdict decision table

use tracing::{debug, instrument, warn};

use crate::compare::{normalize_output, outputs_match};
use crate::runner::{Runner, RunnerError};
use crate::submission::{GradeReport, SubmissionStatus, TestCase, TestCaseResult};
use crate::types::{ExecutionResult, ExecutionStatus};

/// What one execution means for the submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Case passed, move on to the next one
    Continue,
    /// Case failed, grading stops with this verdict
    Stop(SubmissionStatus),
}

/// Map one execution onto the verdict table
///
/// Errors outrank timeouts, which outrank output comparison.
pub fn decide(result: &ExecutionResult, expected_output: &str) -> Decision {
    match result.status {
        ExecutionStatus::CompileError
        | ExecutionStatus::SandboxError
        | ExecutionStatus::RuntimeError => Decision::Stop(SubmissionStatus::RuntimeError),
        ExecutionStatus::TimeLimitExceeded => Decision::Stop(SubmissionStatus::TimeLimitExceeded),
        ExecutionStatus::Ok if !result.is_success() => {
            Decision::Stop(SubmissionStatus::RuntimeError)
        }
        ExecutionStatus::Ok if outputs_match(&result.stdout, expected_output) => {
            Decision::Continue
        }
        ExecutionStatus::Ok => Decision::Stop(SubmissionStatus::WrongAnswer),
    }
}

fn case_result(test_case: &TestCase, result: &ExecutionResult, passed: bool) -> TestCaseResult {
    TestCaseResult {
        test_case_id: test_case.id,
        passed,
        input: test_case.input.clone(),
        expected_output: test_case.expected_output.clone(),
        actual_output: normalize_output(&result.stdout).to_owned(),
        error: result.error_text(),
    }
}

/// Grade code against an ordered set of test cases
///
/// Cases run one after another and grading stops at the first failure, so the
/// report holds one result per case up to and including that failure. A
/// program that does not build yields a single failing result on the first
/// case.
#[instrument(skip(runner, code, test_cases), fields(cases = test_cases.len()))]
pub async fn evaluate(
    runner: &Runner,
    language_id: &str,
    code: &str,
    test_cases: &[TestCase],
) -> Result<GradeReport, RunnerError> {
    runner.language(language_id)?;

    let Some(first) = test_cases.first() else {
        warn!("no test cases, accepting");
        return Ok(GradeReport {
            status: SubmissionStatus::Accepted,
            test_results: Vec::new(),
            runtime: None,
            memory: None,
        });
    };

    let program = runner.prepare(language_id, code.as_bytes()).await?;

    if let Some(failure) = program.compile_failure() {
        debug!(status = ?failure.status, "build failed");
        let mut result = case_result(first, failure, false);
        result.actual_output.clear();
        program.finish();
        return Ok(GradeReport {
            status: SubmissionStatus::RuntimeError,
            test_results: vec![result],
            runtime: None,
            memory: None,
        });
    }

    let mut test_results = Vec::with_capacity(test_cases.len());
    let mut slowest: f64 = 0.0;
    let mut status = SubmissionStatus::Accepted;

    for test_case in test_cases {
        let result = program.run(test_case.input.as_bytes()).await;
        slowest = slowest.max(result.wall_time);

        let decision = decide(&result, &test_case.expected_output);
        debug!(
            test_case = test_case.id,
            ?decision,
            wall_time = result.wall_time,
            "test case finished"
        );

        match decision {
            Decision::Continue => test_results.push(case_result(test_case, &result, true)),
            Decision::Stop(verdict) => {
                test_results.push(case_result(test_case, &result, false));
                status = verdict;
                break;
            }
        }
    }

    program.finish();

    let runtime = (status == SubmissionStatus::Accepted).then_some(slowest);
    Ok(GradeReport {
        status,
        test_results,
        runtime,
        memory: None,
    })
}
