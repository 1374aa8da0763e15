use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::repository::CatalogRepository;
use crate::storage::RepositoryError;

/// Router builder for the catalog CRUD endpoints. Paths and payload shapes
/// match what the dashboards already call.
pub fn catalog_router<C>(repository: Arc<C>) -> Router
where
    C: CatalogRepository + 'static,
{
    Router::new()
        .route("/institutes", get(list_institutions_handler::<C>))
        .route("/faculties/:institution_id", get(list_faculties_handler::<C>))
        .route("/courses/:faculty_id", get(list_courses_handler::<C>))
        .route("/addInstitution", post(add_institution_handler::<C>))
        .route("/addFaculty", post(add_faculty_handler::<C>))
        .route("/addCourse", post(add_course_handler::<C>))
        .route(
            "/deleteInstitution/:id",
            delete(delete_institution_handler::<C>),
        )
        .route("/deleteFaculty/:id", delete(delete_faculty_handler::<C>))
        .route("/deleteCourse/:id", delete(delete_course_handler::<C>))
        .with_state(repository)
}

pub(crate) async fn list_institutions_handler<C>(State(repository): State<Arc<C>>) -> Response
where
    C: CatalogRepository + 'static,
{
    match repository.list_institutions().await {
        Ok(institutions) => (StatusCode::OK, Json(institutions)).into_response(),
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn list_faculties_handler<C>(
    State(repository): State<Arc<C>>,
    Path(institution_id): Path<i64>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    match repository.faculties_for_institution(institution_id).await {
        Ok(faculties) => (StatusCode::OK, Json(faculties)).into_response(),
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn list_courses_handler<C>(
    State(repository): State<Arc<C>>,
    Path(faculty_id): Path<i64>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    match repository.courses_for_faculty(faculty_id).await {
        Ok(courses) => (StatusCode::OK, Json(courses)).into_response(),
        Err(err) => storage_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddInstitutionRequest {
    pub(crate) name: String,
}

pub(crate) async fn add_institution_handler<C>(
    State(repository): State<Arc<C>>,
    Json(payload): Json<AddInstitutionRequest>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    if payload.name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "name is required" })),
        )
            .into_response();
    }

    match repository.add_institution(payload.name.trim()).await {
        Ok(institution) => {
            (StatusCode::OK, Json(json!({ "institution": institution }))).into_response()
        }
        Err(err) => storage_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddFacultyRequest {
    #[serde(rename = "institutionId")]
    pub(crate) institution_id: i64,
    #[serde(rename = "facultyName")]
    pub(crate) faculty_name: String,
}

pub(crate) async fn add_faculty_handler<C>(
    State(repository): State<Arc<C>>,
    Json(payload): Json<AddFacultyRequest>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    if payload.faculty_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "facultyName is required" })),
        )
            .into_response();
    }

    match repository
        .add_faculty(payload.institution_id, payload.faculty_name.trim())
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Faculty added successfully" })),
        )
            .into_response(),
        Err(err) => storage_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddCourseRequest {
    #[serde(rename = "facultyId")]
    pub(crate) faculty_id: i64,
    #[serde(rename = "courseName")]
    pub(crate) course_name: String,
}

pub(crate) async fn add_course_handler<C>(
    State(repository): State<Arc<C>>,
    Json(payload): Json<AddCourseRequest>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    if payload.course_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "courseName is required" })),
        )
            .into_response();
    }

    match repository
        .add_course(payload.faculty_id, payload.course_name.trim())
        .await
    {
        Ok(course) => (StatusCode::OK, Json(json!({ "course": course }))).into_response(),
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn delete_institution_handler<C>(
    State(repository): State<Arc<C>>,
    Path(id): Path<i64>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    match repository.delete_institution(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "message": "Institution deleted" })),
        )
            .into_response(),
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn delete_faculty_handler<C>(
    State(repository): State<Arc<C>>,
    Path(id): Path<i64>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    match repository.delete_faculty(id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Faculty deleted" }))).into_response(),
        Err(err) => storage_error_response(err),
    }
}

pub(crate) async fn delete_course_handler<C>(
    State(repository): State<Arc<C>>,
    Path(id): Path<i64>,
) -> Response
where
    C: CatalogRepository + 'static,
{
    match repository.delete_course(id).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Course deleted" }))).into_response(),
        Err(err) => storage_error_response(err),
    }
}

fn storage_error_response(err: RepositoryError) -> Response {
    error!(%err, "catalog storage failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}
