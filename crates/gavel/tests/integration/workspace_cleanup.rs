use gavel::runner::Runner;

use super::{fixture_source, leftover_workspaces, test_config};

#[tokio::test]
async fn test_concurrent_executions_clean_up() {
    let root = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(root.path()));
    let source = fixture_source("sum.py");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let runner = runner.clone();
            let source = source.clone();
            tokio::spawn(async move {
                runner
                    .execute("python", source.as_bytes(), format!("{i} {i}").as_bytes())
                    .await
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let result = handle.await.unwrap().expect("Execution failed");
        assert_eq!(result.stdout.trim(), (i * 2).to_string());
    }
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn test_compiled_artifacts_are_removed() {
    let root = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(root.path()));

    let result = runner
        .execute("cpp", fixture_source("sum.cpp").as_bytes(), b"2 2")
        .await
        .expect("Execution failed");

    assert!(result.is_success());
    assert_eq!(leftover_workspaces(root.path()), 0);
}
