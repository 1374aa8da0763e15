use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub i64);

/// Contact details supplied by the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// The institution, faculty, and course the student is applying to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSelection {
    pub institution_id: i64,
    pub faculty_id: i64,
    pub course_id: i64,
}

/// Lifecycle status carried by every application. Transitions are
/// unconstrained: any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "Pending",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Accepts exactly the wire labels; anything else is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "Accepted" => Some(Self::Accepted),
            "Rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Applicant-provided fields of a submission, before any attachment handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub applicant: ApplicantDetails,
    pub selection: CourseSelection,
}

/// Raw uploaded file captured from the multipart request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Insert payload handed to the repository once intake checks have passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApplication {
    pub applicant: ApplicantDetails,
    pub selection: CourseSelection,
    pub result_file: Option<String>,
}

/// Stored application as returned from the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    #[serde(flatten)]
    pub applicant: ApplicantDetails,
    #[serde(flatten)]
    pub selection: CourseSelection,
    pub result_file: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Read model produced by the institution-scoped join. Applications whose
/// faculty or course has since been deleted never surface here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRow {
    pub record: ApplicationRecord,
    pub institution_name: String,
    pub faculty_name: String,
    pub course_name: String,
}

impl ApplicationRow {
    /// Wire representation enriched with a derived attachment URL.
    pub fn into_view(self, picture_url: Option<String>) -> ApplicationView {
        ApplicationView {
            id: self.record.id.0,
            name: self.record.applicant.name,
            email: self.record.applicant.email,
            phone: self.record.applicant.phone,
            institution_id: self.record.selection.institution_id,
            faculty_id: self.record.selection.faculty_id,
            course_id: self.record.selection.course_id,
            institution_name: self.institution_name,
            faculty_name: self.faculty_name,
            course_name: self.course_name,
            result_file: self.record.result_file,
            status: self.record.status,
            submitted_at: self.record.submitted_at,
            picture_url,
        }
    }
}

/// JSON shape served to institute and admin dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub institution_id: i64,
    pub faculty_id: i64,
    pub course_id: i64,
    pub institution_name: String,
    pub faculty_name: String,
    pub course_name: String,
    pub result_file: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(rename = "pictureUrl")]
    pub picture_url: Option<String>,
}
