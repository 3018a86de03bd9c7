//! Authentication API Endpoints
//! Mission: Thin axum adapters over the user domain

use crate::auth::{
    errors::AuthError,
    models::{Claims, FieldError, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserResponse},
    service::UserService,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error, info};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub users: UserService,
}

impl AuthState {
    pub fn new(users: UserService) -> Self {
        Self { users }
    }
}

/// Run a blocking domain call (bcrypt, SQLite) off the async workers
async fn run_blocking<T, F>(journey: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            error!(journey, error = %e, "Blocking task failed");
            Err(ApiError::Auth(AuthError::Internal))
        }
    }
}

/// Register endpoint - POST /register
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    info!(journey = "register", "Init register");
    let Json(request) = payload?;

    let users = state.users.clone();
    let user = run_blocking("register", move || users.register(request)).await?;

    Ok(Json(RegisterResponse {
        message: "Registered successfully".to_string(),
        user: UserResponse::from_user(&user),
    }))
}

/// Login endpoint - POST /login
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    info!(journey = "login", "Init login");
    let Json(request) = payload?;

    let users = state.users.clone();
    let response = run_blocking("login", move || users.login(request)).await?;

    Ok(Json(response))
}

/// Get current user info - GET /me (behind auth middleware)
pub async fn me(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, ApiError> {
    let users = state.users.clone();
    let user = run_blocking("me", move || users.current_user(&claims)).await?;
    Ok(Json(UserResponse::from_user(&user)))
}

/// Placeholder - GET/POST /confirm
pub async fn confirm() -> Json<Value> {
    Json(json!({ "result": "User Confirm" }))
}

/// Placeholder - GET/POST /send
pub async fn send() -> Json<Value> {
    Json(json!({ "result": "User Send reset" }))
}

/// Placeholder - GET/POST /reset
pub async fn reset() -> Json<Value> {
    Json(json!({ "result": "User reset password" }))
}

/// Error body: `{code, message, fields?}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Auth API errors
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    MalformedBody,
    MissingToken,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), detail = %rejection.body_text(), "Rejected request body");
        ApiError::MalformedBody
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields) = match self {
            ApiError::Auth(AuthError::Validation(fields)) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                Some(fields),
            ),
            ApiError::Auth(AuthError::UserAlreadyExists) => {
                (StatusCode::CONFLICT, "User already exists".to_string(), None)
            }
            ApiError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
                None,
            ),
            ApiError::Auth(AuthError::InvalidToken) => {
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string(), None)
            }
            ApiError::Auth(AuthError::ExpiredToken) => {
                (StatusCode::UNAUTHORIZED, "Token expired".to_string(), None)
            }
            ApiError::Auth(AuthError::Internal) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
            ApiError::MalformedBody => (
                StatusCode::BAD_REQUEST,
                "Malformed request body".to_string(),
                None,
            ),
            ApiError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing authorization token".to_string(),
                None,
            ),
        };

        let body = ErrorBody {
            code: status.as_u16(),
            message,
            fields,
        };
        (status, Json(body)).into_response()
    }
}
