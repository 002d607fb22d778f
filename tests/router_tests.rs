//! Router-level tests for authentication and permission gates.
//!
//! The pool is created lazily and never connects: every request here is
//! answered before a query would run.

mod common;

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use common::{body_json, send, staff_token, token_for};
use shelfmark_server::models::user::{Permission, UserClaims};

const INSTANCE_ID: &str = "5f0c4e1a-8c3b-4d2e-9a61-2b7d9e0f4c11";

fn build_test_app() -> Router {
    common::build_offline_app()
}

fn patron_token() -> String {
    token_for(7, Vec::new())
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = send(build_test_app(), Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let response = send(
        build_test_app(),
        Method::GET,
        "/api-docs/openapi.json",
        None,
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/book/{id}/renew"].is_object());
}

#[tokio::test]
async fn loan_routes_require_a_token() {
    let renew = format!("/api/v1/book/{}/renew", INSTANCE_ID);
    for uri in ["/api/v1/mybooks", "/api/v1/borrowed", renew.as_str()] {
        let response = send(build_test_app(), Method::GET, uri, None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn malformed_authorization_is_rejected() {
    let app = build_test_app();
    let request = Request::builder()
        .uri("/api/v1/borrowed")
        .header(AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(
        build_test_app(),
        Method::GET,
        "/api/v1/borrowed",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "NotAuthenticated");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let now = Utc::now().timestamp();
    let forged = UserClaims {
        sub: "librarian".to_string(),
        user_id: 1,
        permissions: vec![Permission::CanMarkReturned],
        exp: now + 3600,
        iat: now,
    }
    .create_token("some-other-secret")
    .unwrap();

    let response = send(
        build_test_app(),
        Method::GET,
        "/api/v1/borrowed",
        Some(&forged),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn renewal_is_forbidden_without_permission() {
    let token = patron_token();
    let uri = format!("/api/v1/book/{}/renew", INSTANCE_ID);

    let response = send(build_test_app(), Method::GET, &uri, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        build_test_app(),
        Method::POST,
        &uri,
        Some(&token),
        Some(json!({ "renewal_date": "2024-01-10" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "forbidden");
}

#[tokio::test]
async fn staff_listing_is_forbidden_without_permission() {
    let response = send(
        build_test_app(),
        Method::GET,
        "/api/v1/borrowed",
        Some(&patron_token()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn checkout_and_return_are_forbidden_without_permission() {
    let token = patron_token();

    let response = send(
        build_test_app(),
        Method::POST,
        &format!("/api/v1/bookinstances/{}/checkout", INSTANCE_ID),
        Some(&token),
        Some(json!({ "borrower_id": 7 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        build_test_app(),
        Method::POST,
        &format!("/api/v1/bookinstances/{}/return", INSTANCE_ID),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_writes_are_forbidden_without_permission() {
    let token = patron_token();

    let response = send(
        build_test_app(),
        Method::POST,
        "/api/v1/books",
        Some(&token),
        Some(json!({
            "title": "Kindred",
            "summary": "",
            "isbn": "9780807083697",
            "author_id": null,
            "language_id": null
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        build_test_app(),
        Method::DELETE,
        "/api/v1/authors/1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        build_test_app(),
        Method::DELETE,
        "/api/v1/books/1",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_writes_require_a_token() {
    let response = send(
        build_test_app(),
        Method::POST,
        "/api/v1/authors",
        None,
        Some(json!({ "first_name": "Octavia", "last_name": "Butler" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unreadable_renewal_body_uses_the_error_shape() {
    let staff = staff_token();
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/book/{}/renew", INSTANCE_ID))
        .header(AUTHORIZATION, format!("Bearer {}", staff))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("renewal_date=2024-01-10"))
        .unwrap();

    let response = build_test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "BadValue");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn checkout_without_json_content_type_is_a_bad_request() {
    let staff = staff_token();
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/bookinstances/{}/checkout", INSTANCE_ID))
        .header(AUTHORIZATION, format!("Bearer {}", staff))
        .body(Body::from(r#"{"borrower_id": 7}"#))
        .unwrap();

    let response = build_test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn creating_users_is_forbidden_without_permission() {
    let response = send(
        build_test_app(),
        Method::POST,
        "/api/v1/users",
        Some(&patron_token()),
        Some(json!({ "login": "newpatron", "password": "secret-enough" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
