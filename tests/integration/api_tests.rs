//! API integration tests against a running server
//!
//! Expects a staff account configured with
//! `SHELFMARK_AUTH__ADMIN_LOGIN=admin` and `SHELFMARK_AUTH__ADMIN_PASSWORD=admin`.

use chrono::{Duration, Local};
use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get a staff token
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Creates a book with one available copy and returns the copy's id
async fn create_available_copy(client: &Client, token: &str) -> String {
    let isbn = format!("978{:010}", Local::now().timestamp_subsec_nanos());
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Integration Test Book",
            "summary": "Created by the API tests",
            "isbn": isbn,
            "author_id": null,
            "language_id": null
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let book: Value = response.json().await.expect("Failed to parse response");

    let response = client
        .post(format!("{}/books/{}/instances", BASE_URL, book["id"]))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "imprint": "Test Press, 2024",
            "status": "available"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let instance: Value = response.json().await.expect("Failed to parse response");

    instance["id"].as_str().expect("No instance id").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_get_current_user() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["login"], "admin");
    assert_eq!(body["permissions"], json!(["can_mark_returned"]));
}

#[tokio::test]
#[ignore]
async fn test_dashboard_counts_visits() {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client");

    let first: Value = client
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(first["num_visits"], 0);
    assert!(first["num_books"].is_number());

    let second: Value = client
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(second["num_visits"], 1);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_renewal_workflow() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let instance_id = create_available_copy(&client, &token).await;

    let response = client
        .get(format!("{}/book/{}/renew", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let form: Value = response.json().await.expect("Failed to parse response");
    let proposed = (Local::now().date_naive() + Duration::weeks(3)).to_string();
    assert_eq!(form["renewal_date"], proposed);

    // Too far ahead: form comes back with the submitted date and an error
    let too_late = (Local::now().date_naive() + Duration::weeks(5)).to_string();
    let response = client
        .post(format!("{}/book/{}/renew", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "renewal_date": too_late }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
    let rejected: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(rejected["renewal_date"], too_late);
    assert_eq!(
        rejected["errors"]["renewal_date"][0],
        "invalid date - renewal more than 4 weeks ahead"
    );

    let response = client
        .post(format!("{}/book/{}/renew", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "renewal_date": proposed }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    assert_eq!(response.headers()["location"], "/api/v1/borrowed");
    let renewed: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(renewed["status"], "renewed");
    assert_eq!(renewed["book_instance"]["due_back"], proposed);
}

#[tokio::test]
#[ignore]
async fn test_checkout_and_return() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let instance_id = create_available_copy(&client, &token).await;

    let me: Value = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .post(format!("{}/bookinstances/{}/checkout", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "borrower_id": me["id"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let lent: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(lent["status"], "on_loan");

    let mine: Value = client
        .get(format!("{}/mybooks", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(mine["items"]
        .as_array()
        .expect("items array")
        .iter()
        .any(|item| item["id"] == instance_id.as_str()));

    let response = client
        .post(format!("{}/bookinstances/{}/return", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "available");
    assert!(returned["due_back"].is_null());

    // Second return is refused
    let response = client
        .post(format!("{}/bookinstances/{}/return", BASE_URL, instance_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);
}
