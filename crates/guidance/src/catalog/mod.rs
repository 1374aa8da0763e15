//! Institution, faculty, and course catalog. Plain CRUD with no invariants
//! beyond referential existence; the admissions service consults it before
//! accepting a submission.

pub mod domain;
pub mod repository;
pub mod router;

pub use domain::{Course, Faculty, Institution};
pub use repository::CatalogRepository;
pub use router::catalog_router;
