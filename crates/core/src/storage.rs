use crate::error::IngestError;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Staging area for uploaded files. Staged files are not transactional
/// participants; expired ones are reclaimed by `sweep_older_than`.
#[derive(Debug, Clone)]
pub struct WorkingStorage {
    root: PathBuf,
}

impl WorkingStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn init(&self) -> Result<(), IngestError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Writes the upload under a `{uuid}_{basename}` name. The unique prefix
    /// is collision-proofing, not confidentiality.
    pub async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, IngestError> {
        let base = Path::new(file_name)
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| IngestError::MissingFileName(file_name.to_string()))?;

        let staged = self.root.join(format!("{}_{}", Uuid::new_v4(), base));
        tokio::fs::write(&staged, bytes).await?;
        Ok(staged)
    }

    /// Removes staged files whose modification time is at least `max_age` old.
    /// Returns the number of files removed.
    pub async fn sweep_older_than(&self, max_age: Duration) -> Result<usize, IngestError> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let expired = metadata
                .modified()
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .is_some_and(|age| age >= max_age);

            if expired && tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }

        Ok(removed)
    }
}
