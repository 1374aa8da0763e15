//! Error surface shared by the repository traits in `admissions`, `catalog`,
//! and `accounts`. Concrete implementations live in the API service crate.

/// Failure modes a storage backend may report.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate record")]
    Conflict,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
