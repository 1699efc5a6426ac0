//! Submission persistence
//!
//! [`SubmissionStore`] is the seam to whatever database backs the judge.
//! A record is created pending and moves to its verdict exactly once.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::submission::{GradeReport, Submission, SubmissionStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("submission {0} not found")]
    NotFound(Uuid),

    #[error("submission {id} already finalized as {status}")]
    AlreadyFinalized { id: Uuid, status: SubmissionStatus },

    #[error("submission {0} already exists")]
    Duplicate(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait SubmissionStore: std::fmt::Debug + Send + Sync {
    /// Persist a new pending submission
    async fn create(&self, submission: Submission) -> Result<Submission, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Submission, StoreError>;

    /// Record the verdict of a pending submission
    ///
    /// Fails with [`StoreError::AlreadyFinalized`] if it already has one.
    async fn complete(&self, id: Uuid, report: &GradeReport) -> Result<Submission, StoreError>;

    /// All submissions of a user, oldest first
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Submission>, StoreError>;
}

/// Store keeping submissions in process memory
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    submissions: RwLock<HashMap<Uuid, Submission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.submissions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.submissions.read().await.is_empty()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn create(&self, submission: Submission) -> Result<Submission, StoreError> {
        let mut submissions = self.submissions.write().await;
        if submissions.contains_key(&submission.id) {
            return Err(StoreError::Duplicate(submission.id));
        }
        debug!(id = %submission.id, "submission created");
        submissions.insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get(&self, id: Uuid) -> Result<Submission, StoreError> {
        self.submissions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn complete(&self, id: Uuid, report: &GradeReport) -> Result<Submission, StoreError> {
        let mut submissions = self.submissions.write().await;
        let submission = submissions.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if submission.status.is_terminal() {
            return Err(StoreError::AlreadyFinalized {
                id,
                status: submission.status,
            });
        }
        submission.apply(report);
        debug!(%id, status = %submission.status, "submission finalized");
        Ok(submission.clone())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Submission>, StoreError> {
        let mut found: Vec<Submission> = self
            .submissions
            .read()
            .await
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by_key(|s| s.submitted_at);
        Ok(found)
    }
}
