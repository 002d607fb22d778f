//! Shared helpers for router-level tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

use shelfmark_server::{
    config::AppConfig,
    create_router,
    models::user::{Permission, UserClaims},
    repository::Repository,
    services::Services,
    AppState,
};

/// Full router over the given pool, as `main` builds it
pub fn build_test_app(pool: PgPool) -> Router {
    let config = AppConfig::default();
    let services = Services::new(Repository::new(pool), config.auth.clone());
    create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

/// Router whose pool never connects unless a query runs
pub fn build_offline_app() -> Router {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(&AppConfig::default().database.url)
        .unwrap();
    build_test_app(pool)
}

pub fn token_for(user_id: i32, permissions: Vec<Permission>) -> String {
    let now = Utc::now().timestamp();
    let claims = UserClaims {
        sub: format!("user{}", user_id),
        user_id,
        permissions,
        exp: now + 3600,
        iat: now,
    };
    claims
        .create_token(&AppConfig::default().auth.jwt_secret)
        .unwrap()
}

pub fn staff_token() -> String {
    token_for(1, vec![Permission::CanMarkReturned])
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", bearer));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
