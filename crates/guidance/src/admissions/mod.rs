//! Application lifecycle: submission with a supporting file, institution-scoped
//! review, status triage, and admission release.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantDetails, ApplicationId, ApplicationRecord, ApplicationRow, ApplicationStatus,
    ApplicationSubmission, ApplicationView, AttachmentUpload, CourseSelection, NewApplication,
};
pub use repository::{ApplicationRepository, FileStore, FileStoreError};
pub use router::admissions_router;
pub use service::{AdmissionsError, AdmissionsService, ReleaseOutcome};
