#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use std::sync::Arc;

use oneshot_api::auth::jwt::{generate_access_token, JwtConfig};
use oneshot_api::config::{JourneyConfig, ServerConfig};
use oneshot_api::router::build_app_router;
use oneshot_api::state::{AppState, CatalogHandle};
use oneshot_core::journey::catalog::Catalog;
use oneshot_core::roles::{ROLE_ADMIN, ROLE_MEMBER};

const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        journey: JourneyConfig::default(),
    }
}

/// Build the full application router, serving the embedded catalog.
///
/// Uses the same `build_app_router` as `main.rs` so integration tests
/// exercise the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        catalog: CatalogHandle::new(Catalog::builtin().expect("builtin catalog")),
    };
    build_app_router(state, &config)
}

/// Bearer token for a regular member.
pub fn member_token(user_id: i64) -> String {
    generate_access_token(user_id, ROLE_MEMBER, &test_config().jwt).unwrap()
}

/// Bearer token for an admin.
pub fn admin_token(user_id: i64) -> String {
    generate_access_token(user_id, ROLE_ADMIN, &test_config().jwt).unwrap()
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Send an unauthenticated GET request.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

/// Send an authenticated GET request.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

/// Send an authenticated POST with no body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

/// Send an authenticated PUT with a JSON body.
pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
