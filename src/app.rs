//! Composition root and HTTP router
//!
//! Builds the credential store, password hasher, token handler and user
//! service once, then hands them to the routes as shared state.

use crate::auth::{
    api as auth_api, auth_middleware, AuthState, CredentialStore, JwtHandler, PasswordHasher,
    UserService, UserStore,
};
use crate::config::Config;
use crate::middleware::request_logging;
use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Wire every dependency from configuration
pub fn build_state(config: &Config) -> Result<AuthState> {
    let store = UserStore::new(&config.db_path)
        .with_context(|| format!("Failed to open user store at {}", config.db_path.display()))?;
    let existing = store.count_users().context("Failed to count users")?;
    info!("👥 Existing users in database: {}", existing);

    let hasher = PasswordHasher::new(config.bcrypt_cost)?;
    let ttl = Duration::try_hours(config.token_ttl_hours)
        .with_context(|| format!("Token TTL of {} hours is out of range", config.token_ttl_hours))?;
    let jwt = JwtHandler::new(&config.jwt_secret, ttl);

    Ok(assemble(Arc::new(store), hasher, jwt))
}

/// Assemble state from already-built parts (tests inject their own)
pub fn assemble(
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    jwt: JwtHandler,
) -> AuthState {
    let users = UserService::new(store, Arc::new(hasher), Arc::new(jwt));
    AuthState::new(users)
}

/// Build the full application router
pub fn router(state: AuthState) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(auth_api::me))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/register", post(auth_api::register))
        .route("/login", post(auth_api::login))
        .route("/confirm", get(auth_api::confirm).post(auth_api::confirm))
        .route("/send", get(auth_api::send).post(auth_api::send))
        .route("/reset", get(auth_api::reset).post(auth_api::reset))
        .route("/health", get(health_check))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::MIN_COST;
    use crate::auth::user_store::FailingStore;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let store = Arc::new(UserStore::in_memory().unwrap());
        let hasher = PasswordHasher::new(MIN_COST).unwrap();
        let jwt = JwtHandler::new("router-test-secret-0123", Duration::hours(1));
        router(assemble(store, hasher, jwt))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_then_me() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(post_json(
                "/register",
                json!({"email": "a@x.com", "password": "Secret123", "name": "Alice"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Registered successfully");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert!(body["user"].get("password_hash").is_none());

        let response = app
            .clone()
            .oneshot(post_json(
                "/login",
                json!({"email": "a@x.com", "password": "Secret123"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["token"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["email"], "a@x.com");
        assert_eq!(body["name"], "Alice");
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let app = test_app();

        let missing = app
            .clone()
            .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(missing).await["message"],
            "Missing authorization token"
        );

        let invalid = app
            .oneshot(
                Request::builder()
                    .uri("/me")
                    .header(header::AUTHORIZATION, "Bearer not.a.token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(invalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(invalid).await["message"], "Invalid token");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = test_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["code"], 400);
        // Parser detail stays in the log
        assert_eq!(body["message"], "Malformed request body");

        let missing_field = test_app()
            .oneshot(post_json("/login", json!({"email": 42})))
            .await
            .unwrap();
        assert_eq!(missing_field.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(missing_field).await["message"],
            "Malformed request body"
        );
    }

    #[tokio::test]
    async fn test_storage_failure_is_opaque_500() {
        let hasher = PasswordHasher::new(MIN_COST).unwrap();
        let jwt = JwtHandler::new("router-test-secret-0123", Duration::hours(1));
        let app = router(assemble(Arc::new(FailingStore), hasher, jwt));
        let storage_detail = rusqlite::Error::InvalidQuery.to_string();

        for (uri, body) in [
            (
                "/register",
                json!({"email": "a@x.com", "password": "Secret123"}),
            ),
            ("/login", json!({"email": "a@x.com", "password": "Secret123"})),
        ] {
            let response = app.clone().oneshot(post_json(uri, body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let text = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(!text.contains(&storage_detail), "{uri} leaked: {text}");
            assert!(!text.contains("rusqlite"), "{uri} leaked: {text}");

            let body: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(body["message"], "Internal server error");
        }
    }

    #[tokio::test]
    async fn test_validation_errors_returned() {
        let response = test_app()
            .oneshot(post_json(
                "/register",
                json!({"email": "bad", "password": "short"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Validation failed");
        let fields: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"password"));
    }

    #[tokio::test]
    async fn test_placeholder_routes() {
        let app = test_app();
        for (method, uri) in [
            ("GET", "/confirm"),
            ("POST", "/confirm"),
            ("GET", "/send"),
            ("POST", "/send"),
            ("GET", "/reset"),
            ("POST", "/reset"),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{method} {uri}");
            assert!(body_json(response).await.get("result").is_some());
        }
    }
}
