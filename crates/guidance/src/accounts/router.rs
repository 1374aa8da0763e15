use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::Role;
use super::repository::UserRepository;
use super::service::{AccountsError, AccountsService, RegistrationRequest};

/// Router builder for the single login/registration endpoint the front-end
/// calls. `isRegistering` switches between the two flows.
pub fn accounts_router<U>(service: Arc<AccountsService<U>>) -> Router
where
    U: UserRepository + 'static,
{
    Router::new()
        .route("/login", post(login_handler::<U>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    pub(crate) password: String,
    #[serde(default)]
    pub(crate) username: Option<String>,
    pub(crate) role: String,
    #[serde(default)]
    pub(crate) institute_name: Option<String>,
    #[serde(default, rename = "isRegistering")]
    pub(crate) is_registering: bool,
}

pub(crate) async fn login_handler<U>(
    State(service): State<Arc<AccountsService<U>>>,
    Json(payload): Json<LoginRequest>,
) -> Response
where
    U: UserRepository + 'static,
{
    let Some(role) = Role::parse(&payload.role) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("invalid role '{}'", payload.role) })),
        )
            .into_response();
    };

    if payload.is_registering {
        let request = RegistrationRequest {
            email: payload.email,
            password: payload.password,
            username: payload.username.unwrap_or_default(),
            role,
            institute_name: payload.institute_name,
        };
        match service.register(request).await {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({ "message": "Registration successful" })),
            )
                .into_response(),
            Err(err) => accounts_error_response(err),
        }
    } else {
        match service.login(&payload.email, &payload.password, role).await {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({ "message": "Login successful" })),
            )
                .into_response(),
            Err(err) => accounts_error_response(err),
        }
    }
}

fn accounts_error_response(err: AccountsError) -> Response {
    match err {
        AccountsError::MissingField { .. } | AccountsError::DuplicateEmail => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        AccountsError::InvalidCredentials => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid credentials" })),
        )
            .into_response(),
        AccountsError::Hashing(source) => {
            error!(%source, "password hashing failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
        AccountsError::Repository(source) => {
            error!(%source, "accounts storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal server error" })),
            )
                .into_response()
        }
    }
}
