//! Scratch directory lifecycle
//!
//! Creates, populates and removes the per-execution directory that holds the
//! source file and any compiled artifact.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, instrument, warn};

use crate::sandbox::SandboxError;

const WORKSPACE_PREFIX: &str = "gavel-";

/// A per-execution scratch directory
///
/// Each workspace has a unique random name, so concurrent executions never
/// share files. The directory and everything in it is removed by
/// [`cleanup()`](Self::cleanup) or, failing that, when the workspace is
/// dropped (including during unwinding). Removal failures are logged and
/// otherwise ignored.
///
/// Creation and removal are blocking filesystem calls. Async callers create
/// workspaces with [`open()`](Self::open). Removal stays synchronous because
/// it must also run from `Drop`; a workspace holds only a source file and an
/// artifact.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a new workspace under `root`
    #[instrument]
    pub fn create(root: &Path) -> Result<Self, SandboxError> {
        std::fs::create_dir_all(root).map_err(SandboxError::Workspace)?;
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)
            .map_err(SandboxError::Workspace)?;
        let path = dir.path().to_path_buf();

        debug!(?path, "workspace created");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Create a new workspace under `root` on the blocking thread pool
    pub async fn open(root: PathBuf) -> Result<Self, SandboxError> {
        tokio::task::spawn_blocking(move || Self::create(&root))
            .await
            .map_err(|e| SandboxError::Workspace(std::io::Error::other(e)))?
    }

    /// Get the path to the workspace directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the path to a file inside the workspace
    ///
    /// Returns an error if the name tries to escape the workspace.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, SandboxError> {
        if name.is_empty() || name.contains("..") || name.starts_with('/') {
            return Err(SandboxError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.path.join(name))
    }

    /// Write a file into the workspace
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<PathBuf, SandboxError> {
        let path = self.file_path(name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content).await?;
        debug!(?path, len = content.len(), "wrote file to workspace");
        Ok(path)
    }

    /// Read a file from the workspace
    pub async fn read_file(&self, name: &str) -> Result<Vec<u8>, SandboxError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Check if a file exists in the workspace
    pub async fn file_exists(&self, name: &str) -> Result<bool, SandboxError> {
        let path = self.file_path(name)?;
        Ok(tokio::fs::metadata(&path).await.is_ok())
    }

    /// Remove the workspace directory
    ///
    /// Failures are logged and swallowed; they never affect a verdict.
    pub fn cleanup(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match dir.close() {
            Ok(()) => debug!(path = %self.path.display(), "workspace removed"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove workspace"
            ),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
