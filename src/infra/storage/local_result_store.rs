use std::path::{Component, Path, PathBuf};
use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::ports::ResultStore;
use crate::error::AppError;

/// Result files kept flat in one directory, served as `/results_files/{name}`.
pub struct LocalResultStore {
    root: PathBuf,
}

impl LocalResultStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates the storage directory if it is missing.
    pub async fn ensure_root(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot create {}: {}", self.root.display(), e)))
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf, AppError> {
        let mut components = Path::new(file_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(file_name)),
            _ => Err(AppError::Validation(format!("Invalid result file name: {}", file_name))),
        }
    }
}

#[async_trait]
impl ResultStore for LocalResultStore {
    async fn save(&self, file_name: &str, content: &[u8]) -> Result<(), AppError> {
        let path = self.path_for(file_name)?;
        fs::write(&path, content)
            .await
            .map_err(|e| AppError::Storage(format!("Writing {} failed: {}", path.display(), e)))?;
        debug!(bytes = content.len(), "Stored result file {}", file_name);
        Ok(())
    }

    async fn remove(&self, file_name: &str) -> Result<(), AppError> {
        let path = self.path_for(file_name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Removing {} failed: {}", path.display(), e))),
        }
    }

    async fn exists(&self, file_name: &str) -> bool {
        match self.path_for(file_name) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
