use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use guidance::accounts::{accounts_router, AccountsService, UserRepository};
use guidance::admissions::{
    admissions_router, AdmissionsService, ApplicationRepository, FileStore,
};
use guidance::catalog::{catalog_router, CatalogRepository};

/// Full HTTP surface: application lifecycle, catalog CRUD, accounts,
/// uploaded attachments, and operational endpoints.
pub(crate) fn app_router<R, C, F, U>(
    admissions: Arc<AdmissionsService<R, C, F>>,
    catalog: Arc<C>,
    accounts: Arc<AccountsService<U>>,
    upload_dir: PathBuf,
) -> Router
where
    R: ApplicationRepository + 'static,
    C: CatalogRepository + 'static,
    F: FileStore + 'static,
    U: UserRepository + 'static,
{
    admissions_router(admissions)
        .merge(catalog_router(catalog))
        .merge(accounts_router(accounts))
        .merge(uploads_router(upload_dir))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

fn uploads_router(upload_dir: PathBuf) -> Router {
    Router::new()
        .route("/uploads/:file", get(serve_upload))
        .with_state(Arc::new(upload_dir))
}

/// Serves stored attachments. File names are single path segments; anything
/// that could escape the upload directory is treated as not found.
async fn serve_upload(
    State(root): State<Arc<PathBuf>>,
    Path(file): Path<String>,
) -> impl IntoResponse {
    if file.contains("..") || file.contains('/') || file.contains('\\') {
        return not_found_response();
    }

    match tokio::fs::read(root.join(&file)).await {
        Ok(bytes) => {
            let mime = mime_guess::from_path(&file).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.to_string())],
                bytes,
            )
                .into_response()
        }
        Err(_) => not_found_response(),
    }
}

fn not_found_response() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "File not found" })),
    )
        .into_response()
}
