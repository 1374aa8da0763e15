use async_trait::async_trait;

use super::domain::{Course, Faculty, Institution};
use crate::storage::RepositoryError;

/// Storage abstraction for the catalog. Deletes are unconstrained: removing a
/// faculty or course does not touch rows referencing it.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_institutions(&self) -> Result<Vec<Institution>, RepositoryError>;
    async fn faculties_for_institution(
        &self,
        institution_id: i64,
    ) -> Result<Vec<Faculty>, RepositoryError>;
    async fn courses_for_faculty(&self, faculty_id: i64) -> Result<Vec<Course>, RepositoryError>;

    async fn add_institution(&self, name: &str) -> Result<Institution, RepositoryError>;
    async fn add_faculty(&self, institution_id: i64, name: &str)
        -> Result<Faculty, RepositoryError>;
    async fn add_course(&self, faculty_id: i64, name: &str) -> Result<Course, RepositoryError>;

    async fn delete_institution(&self, id: i64) -> Result<(), RepositoryError>;
    async fn delete_faculty(&self, id: i64) -> Result<(), RepositoryError>;
    async fn delete_course(&self, id: i64) -> Result<(), RepositoryError>;

    async fn institution_exists(&self, id: i64) -> Result<bool, RepositoryError>;
    async fn faculty_exists(&self, id: i64) -> Result<bool, RepositoryError>;
    async fn course_exists(&self, id: i64) -> Result<bool, RepositoryError>;
}
