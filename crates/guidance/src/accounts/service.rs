use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::info;

use super::domain::{NewUser, Role, User};
use super::repository::UserRepository;
use crate::storage::RepositoryError;

/// Registration and login on top of a user repository.
pub struct AccountsService<U> {
    users: Arc<U>,
}

/// Fields collected by the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub role: Role,
    pub institute_name: Option<String>,
}

impl<U> AccountsService<U>
where
    U: UserRepository + 'static,
{
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// Creates an account, hashing the password with argon2 and a fresh salt.
    pub async fn register(&self, request: RegistrationRequest) -> Result<User, AccountsError> {
        require_field("email", &request.email)?;
        require_field("password", &request.password)?;
        require_field("username", &request.username)?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|err| AccountsError::Hashing(err.to_string()))?
            .to_string();

        let user = self
            .users
            .insert(NewUser {
                email: request.email,
                username: request.username,
                role: request.role,
                institute_name: request.institute_name,
                password_hash,
            })
            .await
            .map_err(|err| match err {
                RepositoryError::Conflict => AccountsError::DuplicateEmail,
                other => AccountsError::Repository(other),
            })?;

        info!(user_id = user.id, role = user.role.label(), "account registered");
        Ok(user)
    }

    /// Verifies the credentials against the stored hash. Unknown accounts and
    /// wrong passwords are indistinguishable to the caller.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<User, AccountsError> {
        let user = self
            .users
            .find_by_email_and_role(email, role)
            .await?
            .ok_or(AccountsError::InvalidCredentials)?;

        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|err| AccountsError::Hashing(err.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AccountsError::InvalidCredentials)?;

        Ok(user)
    }
}

fn require_field(field: &'static str, value: &str) -> Result<(), AccountsError> {
    if value.trim().is_empty() {
        Err(AccountsError::MissingField { field })
    } else {
        Ok(())
    }
}

/// Error raised by the accounts service.
#[derive(Debug, thiserror::Error)]
pub enum AccountsError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("an account with this email already exists")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryUsers {
        users: Mutex<Vec<User>>,
        next_id: AtomicI64,
    }

    #[async_trait]
    impl UserRepository for MemoryUsers {
        async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
            let mut guard = self.users.lock().unwrap();
            if guard.iter().any(|existing| existing.email == user.email) {
                return Err(RepositoryError::Conflict);
            }
            let stored = User {
                id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                email: user.email,
                username: user.username,
                role: user.role,
                institute_name: user.institute_name,
                password_hash: user.password_hash,
            };
            guard.push(stored.clone());
            Ok(stored)
        }

        async fn find_by_email_and_role(
            &self,
            email: &str,
            role: Role,
        ) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|user| user.email == email && user.role == role)
                .cloned())
        }
    }

    fn registration() -> RegistrationRequest {
        RegistrationRequest {
            email: "staff@tech.edu".to_string(),
            password: "correct horse".to_string(),
            username: "staff".to_string(),
            role: Role::Institute,
            institute_name: Some("Tech University".to_string()),
        }
    }

    #[tokio::test]
    async fn registration_round_trips_through_login() {
        let service = AccountsService::new(Arc::new(MemoryUsers::default()));

        let user = service.register(registration()).await.expect("registers");
        assert_ne!(user.password_hash, "correct horse");
        assert!(user.password_hash.starts_with("$argon2"));

        let logged_in = service
            .login("staff@tech.edu", "correct horse", Role::Institute)
            .await
            .expect("login succeeds");
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let service = AccountsService::new(Arc::new(MemoryUsers::default()));
        service.register(registration()).await.expect("registers");

        let err = service
            .login("staff@tech.edu", "wrong horse", Role::Institute)
            .await
            .expect_err("login fails");
        assert!(matches!(err, AccountsError::InvalidCredentials));
    }

    #[tokio::test]
    async fn role_mismatch_is_rejected() {
        let service = AccountsService::new(Arc::new(MemoryUsers::default()));
        service.register(registration()).await.expect("registers");

        let err = service
            .login("staff@tech.edu", "correct horse", Role::Student)
            .await
            .expect_err("login fails");
        assert!(matches!(err, AccountsError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_email_is_reported() {
        let service = AccountsService::new(Arc::new(MemoryUsers::default()));
        service.register(registration()).await.expect("registers");

        let err = service
            .register(registration())
            .await
            .expect_err("second registration fails");
        assert!(matches!(err, AccountsError::DuplicateEmail));
    }

    #[tokio::test]
    async fn blank_password_is_rejected_before_hashing() {
        let service = AccountsService::new(Arc::new(MemoryUsers::default()));
        let mut request = registration();
        request.password = "  ".to_string();

        let err = service.register(request).await.expect_err("rejected");
        assert!(matches!(
            err,
            AccountsError::MissingField { field: "password" }
        ));
    }
}
