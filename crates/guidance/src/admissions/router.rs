use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    ApplicantDetails, ApplicationId, ApplicationSubmission, AttachmentUpload, CourseSelection,
};
use super::repository::{ApplicationRepository, FileStore};
use super::service::{AdmissionsError, AdmissionsService};
use crate::catalog::repository::CatalogRepository;

/// Router builder exposing the application lifecycle endpoints.
pub fn admissions_router<R, C, F>(service: Arc<AdmissionsService<R, C, F>>) -> Router
where
    R: ApplicationRepository + 'static,
    C: CatalogRepository + 'static,
    F: FileStore + 'static,
{
    Router::new()
        .route("/apply", post(apply_handler::<R, C, F>))
        .route(
            "/applications/institution/:institution_id",
            get(institution_applications_handler::<R, C, F>),
        )
        .route(
            "/updateApplicationStatus/:application_id",
            put(update_status_handler::<R, C, F>),
        )
        .route(
            "/releaseAdmissions/:institution_id",
            post(release_admissions_handler::<R, C, F>),
        )
        .with_state(service)
}

pub(crate) async fn apply_handler<R, C, F>(
    State(service): State<Arc<AdmissionsService<R, C, F>>>,
    multipart: Multipart,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CatalogRepository + 'static,
    F: FileStore + 'static,
{
    let (submission, attachment) = match parse_apply_form(multipart).await {
        Ok(parsed) => parsed,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };

    match service.submit(submission, attachment).await {
        Ok(record) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Application submitted successfully!",
                "application": record,
            })),
        )
            .into_response(),
        Err(err) => admissions_error_response(err),
    }
}

pub(crate) async fn institution_applications_handler<R, C, F>(
    State(service): State<Arc<AdmissionsService<R, C, F>>>,
    Path(institution_id): Path<i64>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CatalogRepository + 'static,
    F: FileStore + 'static,
{
    match service.applications_for_institution(institution_id).await {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => admissions_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

pub(crate) async fn update_status_handler<R, C, F>(
    State(service): State<Arc<AdmissionsService<R, C, F>>>,
    Path(application_id): Path<i64>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CatalogRepository + 'static,
    F: FileStore + 'static,
{
    let Some(status) = payload.status.filter(|value| !value.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Status is required" })),
        )
            .into_response();
    };

    match service
        .update_status(ApplicationId(application_id), &status)
        .await
    {
        Ok(status) => (
            StatusCode::OK,
            Json(json!({
                "message": format!(
                    "Application status updated to {} successfully",
                    status.label()
                ),
            })),
        )
            .into_response(),
        Err(err) => admissions_error_response(err),
    }
}

pub(crate) async fn release_admissions_handler<R, C, F>(
    State(service): State<Arc<AdmissionsService<R, C, F>>>,
    Path(institution_id): Path<i64>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: CatalogRepository + 'static,
    F: FileStore + 'static,
{
    match service.release_admissions(institution_id).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "message": "Admissions released successfully",
                "acceptedApplications": outcome.accepted_applications,
                "finalized": outcome.finalized,
            })),
        )
            .into_response(),
        Err(AdmissionsError::UnknownInstitution(_)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Institution not found" })),
        )
            .into_response(),
        Err(err) => admissions_error_response(err),
    }
}

/// Collects the multipart fields of a submission. Applicant text fields may
/// arrive blank (the service reports which one is missing); the numeric
/// selection fields must be present and well-formed.
async fn parse_apply_form(
    mut multipart: Multipart,
) -> Result<(ApplicationSubmission, Option<AttachmentUpload>), String> {
    let mut name = String::new();
    let mut email = String::new();
    let mut phone = String::new();
    let mut institution_id: Option<i64> = None;
    let mut faculty_id: Option<i64> = None;
    let mut course_id: Option<i64> = None;
    let mut attachment: Option<AttachmentUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("malformed multipart request: {err}"))?
    {
        let Some(field_name) = field.name().map(str::to_string) else {
            continue;
        };

        if field_name == "resultFile" {
            let file_name = field.file_name().unwrap_or("attachment").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|err| format!("failed to read {field_name}: {err}"))?;
            attachment = Some(AttachmentUpload {
                file_name,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|err| format!("failed to read {field_name}: {err}"))?;

        match field_name.as_str() {
            "name" => name = value,
            "email" => email = value,
            "phone" => phone = value,
            "institutionId" => institution_id = Some(parse_id(&field_name, &value)?),
            "facultyId" => faculty_id = Some(parse_id(&field_name, &value)?),
            "courseId" => course_id = Some(parse_id(&field_name, &value)?),
            _ => {}
        }
    }

    let selection = CourseSelection {
        institution_id: institution_id.ok_or("institutionId is required")?,
        faculty_id: faculty_id.ok_or("facultyId is required")?,
        course_id: course_id.ok_or("courseId is required")?,
    };

    Ok((
        ApplicationSubmission {
            applicant: ApplicantDetails { name, email, phone },
            selection,
        },
        attachment,
    ))
}

fn parse_id(field: &str, value: &str) -> Result<i64, String> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("{field} must be a number"))
}

fn admissions_error_response(err: AdmissionsError) -> Response {
    match err {
        AdmissionsError::MissingField { .. }
        | AdmissionsError::InvalidStatus { .. }
        | AdmissionsError::UnknownInstitution(_)
        | AdmissionsError::UnknownFaculty(_)
        | AdmissionsError::UnknownCourse(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        AdmissionsError::ApplicationNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Application not found" })),
        )
            .into_response(),
        AdmissionsError::Repository(source) => {
            error!(%source, "admissions storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
        AdmissionsError::Files(source) => {
            error!(%source, "attachment intake failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}
