//! Temp storage provider
//!
//! Uploaded bytes are written under the upload directory with a unique
//! stored name and released unconditionally once the owning item has
//! settled, independent of its outcome.

use filebatch_common::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Disk-backed temp storage rooted at the configured upload directory
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if missing
    pub async fn ensure_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Unique stored name: `{uuid}-{original basename}`
    ///
    /// Any path components in the client-supplied name are discarded.
    pub fn stored_name(original_name: &str) -> String {
        let basename = Path::new(original_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        format!("{}-{}", Uuid::new_v4(), basename)
    }

    /// Write uploaded bytes; returns the temp path handed to the core
    pub async fn store(&self, stored_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(stored_name);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Remove a temp file. Callers treat failure as log-only; it never
    /// changes an item's outcome.
    pub async fn release(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
