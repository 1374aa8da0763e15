//! Account registration and login for admin, institute, and student users.
//! Passwords are stored as salted argon2 hashes, never in plaintext.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{NewUser, Role, User};
pub use repository::UserRepository;
pub use router::accounts_router;
pub use service::{AccountsError, AccountsService, RegistrationRequest};
