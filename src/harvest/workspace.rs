//! Per-task filesystem isolation with guaranteed cleanup

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Disambiguates workspaces created within the same nanosecond
static WORKSPACE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Isolated filesystem area holding one repository's archive and its
/// extracted tree.
///
/// Each workspace is used by exactly one task and is never shared. Cleanup
/// runs on `Drop`, so the directory is removed whether the task succeeds,
/// fails, or is cancelled mid-flight.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create a uniquely named workspace under the given parent directory.
    ///
    /// Uniqueness comes from a high-resolution timestamp plus a process-wide
    /// sequence number, so concurrently created workspaces never collide.
    pub fn create(parent: &Path) -> std::io::Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = WORKSPACE_SEQ.fetch_add(1, Ordering::Relaxed);
        let root = parent.join(format!("{nanos}-{seq}"));

        std::fs::create_dir_all(root.join("extracted"))?;
        Ok(Self { root })
    }

    /// Where the downloaded archive bytes are persisted
    pub fn archive_path(&self) -> PathBuf {
        self.root.join("archive.tar.gz")
    }

    /// Directory the archive is extracted into
    pub fn extract_dir(&self) -> PathBuf {
        self.root.join("extracted")
    }

    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.root.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.root) {
                tracing::warn!(
                    path = %self.root.display(),
                    error = %e,
                    "Failed to remove workspace"
                );
            }
        }
    }
}
