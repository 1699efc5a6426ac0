use std::sync::Arc;

use gavel::{
    Grader, InMemoryProblemSet, InMemorySubmissionStore, ProblemFile, Runner, SubmissionRequest,
    SubmissionStatus, SubmissionStore,
};

use super::{fixture_path, fixture_source, leftover_workspaces, test_config};

async fn grader(config: gavel::Config) -> (Grader, Arc<InMemorySubmissionStore>) {
    let problems = Arc::new(InMemoryProblemSet::new());
    for name in ["sum.toml", "sum_wrong.toml"] {
        let problem = ProblemFile::from_file(fixture_path("problems", name))
            .expect("Failed to load problem");
        problems.add_file(problem).await;
    }
    let store = Arc::new(InMemorySubmissionStore::new());
    (
        Grader::new(Runner::new(config), problems, store.clone()),
        store,
    )
}

fn request(problem_id: &str, language: &str, source: &str) -> SubmissionRequest {
    SubmissionRequest {
        user_id: "tester".to_owned(),
        problem_id: problem_id.to_owned(),
        code: fixture_source(source),
        language: language.to_owned(),
    }
}

#[tokio::test]
async fn test_python_accepted() {
    let root = tempfile::tempdir().unwrap();
    let (grader, store) = grader(test_config(root.path())).await;

    let submission = grader
        .submit_and_grade(request("sum", "python", "sum.py"))
        .await
        .expect("Grading failed");

    assert_eq!(submission.status, SubmissionStatus::Accepted);
    assert_eq!(submission.test_case_results.len(), 2);
    assert!(submission.test_case_results.iter().all(|r| r.passed));
    assert!(submission.runtime.is_some());
    assert_eq!(
        store.get(submission.id).await.unwrap().status,
        SubmissionStatus::Accepted
    );
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn test_python_wrong_answer() {
    let root = tempfile::tempdir().unwrap();
    let (grader, _) = grader(test_config(root.path())).await;

    let submission = grader
        .submit_and_grade(request("sum-wrong", "python", "sum.py"))
        .await
        .expect("Grading failed");

    assert_eq!(submission.status, SubmissionStatus::WrongAnswer);
    assert_eq!(submission.test_case_results.len(), 2);
    assert!(submission.test_case_results[0].passed);
    let failed = &submission.test_case_results[1];
    assert!(!failed.passed);
    assert_eq!(failed.actual_output, "7");
}

#[tokio::test]
async fn test_python_time_limit_exceeded() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.default_limits.run_timeout = Some(2.0);
    let (grader, _) = grader(config).await;

    let submission = grader
        .submit_and_grade(request("sum", "python", "loop.py"))
        .await
        .expect("Grading failed");

    assert_eq!(submission.status, SubmissionStatus::TimeLimitExceeded);
    assert_eq!(submission.test_case_results.len(), 1);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn test_python_syntax_error() {
    let root = tempfile::tempdir().unwrap();
    let (grader, _) = grader(test_config(root.path())).await;

    let submission = grader
        .submit_and_grade(request("sum", "python", "syntax_error.py"))
        .await
        .expect("Grading failed");

    assert_eq!(submission.status, SubmissionStatus::RuntimeError);
    assert_eq!(submission.test_case_results.len(), 1);
    let error = submission.test_case_results[0].error.as_deref().unwrap();
    assert!(error.contains("SyntaxError"));
}

#[tokio::test]
async fn test_javascript_accepted() {
    let root = tempfile::tempdir().unwrap();
    let (grader, _) = grader(test_config(root.path())).await;

    let submission = grader
        .submit_and_grade(request("sum", "javascript", "sum.js"))
        .await
        .expect("Grading failed");

    assert_eq!(submission.status, SubmissionStatus::Accepted);
}

#[tokio::test]
async fn test_cpp_accepted() {
    let root = tempfile::tempdir().unwrap();
    let (grader, _) = grader(test_config(root.path())).await;

    let submission = grader
        .submit_and_grade(request("sum", "cpp", "sum.cpp"))
        .await
        .expect("Grading failed");

    assert_eq!(submission.status, SubmissionStatus::Accepted);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn test_cpp_compile_error_is_runtime_error() {
    let root = tempfile::tempdir().unwrap();
    let (grader, _) = grader(test_config(root.path())).await;

    let submission = grader
        .submit_and_grade(request("sum", "cpp", "broken.cpp"))
        .await
        .expect("Grading failed");

    assert_eq!(submission.status, SubmissionStatus::RuntimeError);
    assert_eq!(submission.test_case_results.len(), 1);
    assert!(!submission.test_case_results[0]
        .error
        .as_deref()
        .unwrap()
        .trim()
        .is_empty());
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn test_grading_is_deterministic() {
    let root = tempfile::tempdir().unwrap();
    let (grader, _) = grader(test_config(root.path())).await;

    let mut verdicts = Vec::new();
    for _ in 0..3 {
        let submission = grader
            .submit_and_grade(request("sum-wrong", "python", "sum.py"))
            .await
            .expect("Grading failed");
        verdicts.push((submission.status, submission.test_case_results));
    }
    assert!(verdicts.windows(2).all(|pair| pair[0] == pair[1]));
}
