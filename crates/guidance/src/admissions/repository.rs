use async_trait::async_trait;

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationRow, ApplicationStatus, NewApplication,
};
use crate::storage::RepositoryError;

/// Storage abstraction for the application lifecycle so the service can be
/// exercised against in-memory fakes as well as the MySQL backend.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    /// Persists a new application with status `Pending` and returns the stored
    /// record, generated identifier included.
    async fn insert(
        &self,
        application: NewApplication,
    ) -> Result<ApplicationRecord, RepositoryError>;

    /// Inner-joined listing for one institution. Rows referencing a deleted
    /// faculty or course are omitted, not reported.
    async fn list_for_institution(
        &self,
        institution_id: i64,
    ) -> Result<Vec<ApplicationRow>, RepositoryError>;

    /// Overwrites the status unconditionally. Returns `false` when no row
    /// matched the identifier (affected-row check, no pre-read).
    async fn set_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<bool, RepositoryError>;

    /// Number of an institution's applications currently in `status`.
    async fn count_with_status(
        &self,
        institution_id: i64,
        status: ApplicationStatus,
    ) -> Result<u64, RepositoryError>;
}

/// Attachment sink for submitted result files.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persists the upload and returns the relative path it will later be
    /// served from under the `/uploads` prefix.
    async fn store(&self, file_name: &str, bytes: &[u8]) -> Result<String, FileStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FileStoreError {
    #[error("attachment storage failed: {0}")]
    Io(#[from] std::io::Error),
}
