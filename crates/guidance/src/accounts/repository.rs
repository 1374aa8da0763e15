use async_trait::async_trait;

use super::domain::{NewUser, Role, User};
use crate::storage::RepositoryError;

/// Storage abstraction for accounts. Emails are unique; a duplicate insert
/// reports `RepositoryError::Conflict`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;
    async fn find_by_email_and_role(
        &self,
        email: &str,
        role: Role,
    ) -> Result<Option<User>, RepositoryError>;
}
