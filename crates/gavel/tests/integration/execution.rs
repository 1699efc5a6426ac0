use gavel::runner::Runner;
use gavel::types::ExecutionStatus;

use super::{fixture_source, test_config};

#[tokio::test]
async fn test_python_sum() {
    let root = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(root.path()));

    let result = runner
        .execute("python", fixture_source("sum.py").as_bytes(), b"3 4\n")
        .await
        .expect("Execution failed");

    assert!(result.is_success());
    assert_eq!(result.stdout.trim(), "7");
}

#[tokio::test]
async fn test_javascript_sum() {
    let root = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(root.path()));

    let result = runner
        .execute("javascript", fixture_source("sum.js").as_bytes(), b"10 32")
        .await
        .expect("Execution failed");

    assert!(result.is_success());
    assert_eq!(result.stdout.trim(), "42");
}

#[tokio::test]
async fn test_cpp_sum() {
    let root = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(root.path()));

    let result = runner
        .execute("cpp", fixture_source("sum.cpp").as_bytes(), b"1000000000000 1")
        .await
        .expect("Execution failed");

    assert!(result.is_success());
    assert_eq!(result.stdout.trim(), "1000000000001");
}

#[tokio::test]
async fn test_cpp_compile_error() {
    let root = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(root.path()));

    let result = runner
        .execute("cpp", fixture_source("broken.cpp").as_bytes(), b"")
        .await
        .expect("Execution failed");

    assert_eq!(result.status, ExecutionStatus::CompileError);
    assert_ne!(result.exit_code, Some(0));
    assert!(result.stderr.contains("error"));
}

#[tokio::test]
async fn test_python_crash() {
    let root = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(root.path()));

    let result = runner
        .execute("python", fixture_source("crash.py").as_bytes(), b"")
        .await
        .expect("Execution failed");

    assert_eq!(result.status, ExecutionStatus::RuntimeError);
    assert_eq!(result.exit_code, Some(3));
    assert!(result.stderr.contains("about to fail"));
}

#[tokio::test]
async fn test_python_timeout() {
    let root = tempfile::tempdir().unwrap();
    let mut config = test_config(root.path());
    config.default_limits.run_timeout = Some(1.0);
    let runner = Runner::new(config);

    let started = std::time::Instant::now();
    let result = runner
        .execute("python", fixture_source("loop.py").as_bytes(), b"")
        .await
        .expect("Execution failed");

    assert_eq!(result.status, ExecutionStatus::TimeLimitExceeded);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}
