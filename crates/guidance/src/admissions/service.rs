use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, ApplicationView,
    AttachmentUpload, NewApplication,
};
use super::repository::{ApplicationRepository, FileStore, FileStoreError};
use crate::catalog::repository::CatalogRepository;
use crate::config::StorageConfig;
use crate::storage::RepositoryError;

/// Service composing intake validation, file intake, and the status workflow.
pub struct AdmissionsService<R, C, F> {
    applications: Arc<R>,
    catalog: Arc<C>,
    files: Arc<F>,
    storage: StorageConfig,
}

impl<R, C, F> AdmissionsService<R, C, F>
where
    R: ApplicationRepository + 'static,
    C: CatalogRepository + 'static,
    F: FileStore + 'static,
{
    pub fn new(
        applications: Arc<R>,
        catalog: Arc<C>,
        files: Arc<F>,
        storage: StorageConfig,
    ) -> Self {
        Self {
            applications,
            catalog,
            files,
            storage,
        }
    }

    /// Submit a new application, returning the stored record.
    ///
    /// Referenced institution, faculty, and course must exist; a dangling
    /// selection is reported as a validation error rather than silently
    /// inserted. The attachment lands on disk before the row is written, so a
    /// crash in between leaves an unreferenced file, never a row pointing at
    /// a missing one.
    pub async fn submit(
        &self,
        submission: ApplicationSubmission,
        attachment: Option<AttachmentUpload>,
    ) -> Result<ApplicationRecord, AdmissionsError> {
        require_field("name", &submission.applicant.name)?;
        require_field("email", &submission.applicant.email)?;
        require_field("phone", &submission.applicant.phone)?;

        let selection = submission.selection;
        if !self.catalog.institution_exists(selection.institution_id).await? {
            return Err(AdmissionsError::UnknownInstitution(selection.institution_id));
        }
        if !self.catalog.faculty_exists(selection.faculty_id).await? {
            return Err(AdmissionsError::UnknownFaculty(selection.faculty_id));
        }
        if !self.catalog.course_exists(selection.course_id).await? {
            return Err(AdmissionsError::UnknownCourse(selection.course_id));
        }

        let result_file = match attachment {
            Some(upload) => Some(self.files.store(&upload.file_name, &upload.bytes).await?),
            None => None,
        };

        let record = self
            .applications
            .insert(NewApplication {
                applicant: submission.applicant,
                selection,
                result_file,
            })
            .await?;

        info!(
            application_id = record.id.0,
            institution_id = selection.institution_id,
            "application submitted"
        );
        Ok(record)
    }

    /// All applications for one institution, enriched with catalog names and
    /// a derived attachment URL. Empty when the institution has none.
    pub async fn applications_for_institution(
        &self,
        institution_id: i64,
    ) -> Result<Vec<ApplicationView>, AdmissionsError> {
        let rows = self
            .applications
            .list_for_institution(institution_id)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let picture_url = row
                    .record
                    .result_file
                    .as_deref()
                    .map(|path| self.storage.attachment_url(path));
                row.into_view(picture_url)
            })
            .collect())
    }

    /// Overwrites the status of one application. Any member of the closed
    /// status set may follow any other, including re-applying the current
    /// value.
    pub async fn update_status(
        &self,
        id: ApplicationId,
        status: &str,
    ) -> Result<ApplicationStatus, AdmissionsError> {
        let status =
            ApplicationStatus::parse(status).ok_or_else(|| AdmissionsError::InvalidStatus {
                value: status.to_string(),
            })?;

        let matched = self.applications.set_status(id, status).await?;
        if !matched {
            return Err(AdmissionsError::ApplicationNotFound(id));
        }

        info!(application_id = id.0, status = status.label(), "application status updated");
        Ok(status)
    }

    /// Acknowledges a release request for an institution.
    ///
    /// The upstream contract never defined a finalization side effect, so none
    /// is performed here; the outcome says so explicitly instead of implying a
    /// bulk mutation happened.
    pub async fn release_admissions(
        &self,
        institution_id: i64,
    ) -> Result<ReleaseOutcome, AdmissionsError> {
        if !self.catalog.institution_exists(institution_id).await? {
            return Err(AdmissionsError::UnknownInstitution(institution_id));
        }

        let accepted = self
            .applications
            .count_with_status(institution_id, ApplicationStatus::Accepted)
            .await?;

        warn!(
            institution_id,
            accepted_applications = accepted,
            "admission release requested; no finalization side effect is defined"
        );

        Ok(ReleaseOutcome {
            institution_id,
            accepted_applications: accepted,
            finalized: false,
        })
    }
}

fn require_field(field: &'static str, value: &str) -> Result<(), AdmissionsError> {
    if value.trim().is_empty() {
        Err(AdmissionsError::MissingField { field })
    } else {
        Ok(())
    }
}

/// Result of an admission-release request. `finalized` stays `false` until a
/// real finalization contract exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReleaseOutcome {
    pub institution_id: i64,
    pub accepted_applications: u64,
    pub finalized: bool,
}

/// Error raised by the admissions service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionsError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("Invalid status")]
    InvalidStatus { value: String },
    #[error("institution {0} does not exist")]
    UnknownInstitution(i64),
    #[error("faculty {0} does not exist")]
    UnknownFaculty(i64),
    #[error("course {0} does not exist")]
    UnknownCourse(i64),
    #[error("application not found")]
    ApplicationNotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Files(#[from] FileStoreError),
}
