//! Patch application capability.
//!
//! The review engine only needs two operations: a "can this patch apply
//! cleanly?" probe and the apply effect itself. [`GitApplier`] implements
//! both by shelling out to `git apply`; tests substitute an in-memory
//! implementation.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("failed to invoke git: {0}")]
    Io(#[from] std::io::Error),

    #[error("git apply exited with {status}")]
    Git { status: ExitStatus },
}

pub trait PatchApplier {
    /// Probe whether the patch would apply cleanly against its current
    /// target.
    fn can_apply(&self, patch_file: &Path) -> bool;

    /// Apply the patch. A failure after a successful probe means the target
    /// changed underneath us.
    fn apply(&self, patch_file: &Path) -> Result<(), ApplyError>;
}

/// Applies patches via the `git apply` porcelain.
pub struct GitApplier;

impl PatchApplier for GitApplier {
    fn can_apply(&self, patch_file: &Path) -> bool {
        Command::new("git")
            .args(["apply", "--check"])
            .arg(patch_file)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn apply(&self, patch_file: &Path) -> Result<(), ApplyError> {
        let status = Command::new("git").arg("apply").arg(patch_file).status()?;
        if !status.success() {
            return Err(ApplyError::Git { status });
        }
        Ok(())
    }
}
