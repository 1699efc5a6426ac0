//! Problems and their test cases
//!
//! The grader only needs the ordered test cases of a problem. They come from a
//! [`ProblemSource`]: an in-memory set, or problem files on disk.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use config::{Config as ConfigBuilder, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::submission::TestCase;

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("problem '{0}' not found")]
    NotFound(String),

    #[error("failed to parse problem: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("invalid problem: {0}")]
    Invalid(String),
}

#[async_trait]
pub trait ProblemSource: std::fmt::Debug + Send + Sync {
    /// Every test case of a problem, hidden ones included, in grading order
    async fn test_cases(&self, problem_id: &str) -> Result<Vec<TestCase>, ProblemError>;
}

/// Problems held in process memory
#[derive(Debug, Default)]
pub struct InMemoryProblemSet {
    problems: RwLock<HashMap<String, Vec<TestCase>>>,
}

impl InMemoryProblemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a problem, replacing any with the same id
    pub async fn insert(&self, problem_id: impl Into<String>, test_cases: Vec<TestCase>) {
        self.problems
            .write()
            .await
            .insert(problem_id.into(), test_cases);
    }

    pub async fn add_file(&self, problem: ProblemFile) {
        let test_cases = problem.test_cases();
        self.insert(problem.id, test_cases).await;
    }
}

#[async_trait]
impl ProblemSource for InMemoryProblemSet {
    async fn test_cases(&self, problem_id: &str) -> Result<Vec<TestCase>, ProblemError> {
        self.problems
            .read()
            .await
            .get(problem_id)
            .cloned()
            .ok_or_else(|| ProblemError::NotFound(problem_id.to_owned()))
    }
}

/// A problem described in TOML
///
/// ```toml
/// id = "sum"
/// title = "A + B"
///
/// [[test_cases]]
/// input = "1 2"
/// expected_output = "3"
///
/// [[test_cases]]
/// input = "3 4"
/// expected_output = "7"
/// hidden = true
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemFile {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub test_cases: Vec<ProblemTestCase>,
}

/// A test case as written in a problem file
#[derive(Debug, Clone, Deserialize)]
pub struct ProblemTestCase {
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub hidden: bool,
}

impl ProblemFile {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProblemError> {
        let problem: ProblemFile = ConfigBuilder::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn parse_toml(content: &str) -> Result<Self, ProblemError> {
        let problem: ProblemFile = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        problem.validate()?;
        Ok(problem)
    }

    fn validate(&self) -> Result<(), ProblemError> {
        if self.id.trim().is_empty() {
            return Err(ProblemError::Invalid("problem id is empty".to_owned()));
        }
        Ok(())
    }

    /// Test cases in file order, numbered from 1
    pub fn test_cases(&self) -> Vec<TestCase> {
        self.test_cases
            .iter()
            .zip(1..)
            .map(|(case, id)| TestCase {
                id,
                input: case.input.clone(),
                expected_output: case.expected_output.clone(),
                hidden: case.hidden,
            })
            .collect()
    }
}
