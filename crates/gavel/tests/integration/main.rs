//! Integration tests for gavel
//!
//! These tests run real toolchains and need `python3`, `node` and `g++` on PATH.
//! Run with: cargo test -p gavel --features integration-tests

#![cfg(feature = "integration-tests")]

use std::fs;
use std::path::Path;

use gavel::config::Config;

mod config_loading;
mod execution;
mod grading;
mod workspace_cleanup;

const FIXTURES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

/// Helper to get fixture file content
pub(crate) fn fixture_source(name: &str) -> String {
    let path = format!("{FIXTURES_PATH}/sources/{name}");
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read fixture {path}: {e}"))
}

pub(crate) fn fixture_path(kind: &str, name: &str) -> String {
    format!("{FIXTURES_PATH}/{kind}/{name}")
}

/// Default language table with workspaces under `root`
pub(crate) fn test_config(root: &Path) -> Config {
    Config {
        work_dir: Some(root.to_path_buf()),
        ..Config::default()
    }
}

pub(crate) fn leftover_workspaces(root: &Path) -> usize {
    fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
}
