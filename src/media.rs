use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{generate_stored_suffix, BLOB_DELETE_TIMEOUT_SECS};
use crate::db::DynError;

/// Filesystem-backed blob store for uploaded media.
///
/// The lifecycle core only needs save, an idempotent delete, and URL/path
/// mapping; everything else about media handling lives outside this crate.
#[derive(Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Open the store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DynError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| format!("Failed to create media directory '{}': {}", root.display(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Build a storage key from the original filename:
    /// sanitized basename + upload time + random suffix + original extension
    pub fn generate_stored_name(&self, original_name: &str, created_at_ms: i64) -> String {
        let path = Path::new(original_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let sanitized: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        format!(
            "{}_{}_{}{}",
            created_at_ms,
            sanitized,
            generate_stored_suffix(),
            ext
        )
    }

    pub fn path_for(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    /// Public URL under which the static file route serves this blob
    pub fn public_url(&self, stored_name: &str) -> String {
        format!("/uploads/{}", stored_name)
    }

    /// Write a blob to disk
    pub async fn save(&self, stored_name: &str, data: &[u8]) -> Result<(), DynError> {
        let path = self.path_for(stored_name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| format!("Failed to write media file '{}': {}", path.display(), e))?;
        Ok(())
    }

    /// Delete a blob, treating an already-absent file as success.
    ///
    /// Idempotence here is a hard contract: a purge pass that deleted the
    /// file but failed before deleting the record re-runs this on the next
    /// tick, and must not wedge on NotFound. The whole operation is bounded
    /// so one unreachable filesystem cannot stall a purge tick.
    pub async fn delete(&self, stored_name: &str) -> Result<(), DynError> {
        let path = self.path_for(stored_name);
        let timeout = Duration::from_secs(BLOB_DELETE_TIMEOUT_SECS);

        let result = tokio::time::timeout(timeout, tokio::fs::remove_file(&path)).await;
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
            Ok(Err(e)) => {
                Err(format!("Failed to delete media file '{}': {}", path.display(), e).into())
            }
            Err(_) => Err(format!(
                "Timed out after {}s deleting media file '{}'",
                BLOB_DELETE_TIMEOUT_SECS,
                path.display()
            )
            .into()),
        }
    }
}
