//! Fake language tables for tests that should run without real toolchains

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{CompileConfig, Config, FileExtension, Language, RunConfig};
use crate::types::ExecutionLimits;

/// Interpreted shell: the source is run with `sh`
pub(crate) fn shell() -> Language {
    Language {
        name: "Shell".to_owned(),
        extension: FileExtension::new("sh").unwrap(),
        compile: None,
        run: RunConfig {
            command: vec!["sh".to_owned(), "{source}".to_owned()],
            env: HashMap::new(),
        },
        limits: None,
    }
}

/// Compiled shell: `sh -n` plays the compiler and the "binary" is a copy
/// of the checked script
pub(crate) fn compiled_shell() -> Language {
    Language {
        name: "Compiled shell".to_owned(),
        extension: FileExtension::new("sh").unwrap(),
        compile: Some(CompileConfig {
            command: vec![
                "sh".to_owned(),
                "-c".to_owned(),
                r#"sh -n "$1" && cp "$1" "$2""#.to_owned(),
                "compile".to_owned(),
                "{source}".to_owned(),
                "{output}".to_owned(),
            ],
            source_name: "prog.sh".to_owned(),
            output_name: "prog".to_owned(),
            env: HashMap::new(),
        }),
        run: RunConfig {
            command: vec!["sh".to_owned(), "{binary}".to_owned()],
            env: HashMap::new(),
        },
        limits: None,
    }
}

/// Config with `sh` and `shc` whose workspaces live under `root`
pub(crate) fn config(root: &std::path::Path, run_timeout: f64) -> Arc<Config> {
    let config = Config {
        work_dir: Some(root.to_path_buf()),
        default_limits: ExecutionLimits::default().with_run_timeout(run_timeout),
        ..Config::empty()
    }
    .with_language("sh", shell())
    .with_language("shc", compiled_shell());
    Arc::new(config)
}

/// Number of entries left under a workspace root
pub(crate) fn leftover_workspaces(root: &std::path::Path) -> usize {
    std::fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
}
