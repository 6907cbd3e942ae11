//! Registration scenarios.

use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::e2e_tests::helpers::*;
use crate::store::UserStore;

#[tokio::test]
async fn test_register_then_duplicate() {
    let server = TestServer::new();

    let first = server.register(EMAIL, PASSWORD).await;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = server.register(EMAIL, PASSWORD).await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["error"], "email already registered");
}

#[tokio::test]
async fn test_register_weak_password_lists_failed_rules() {
    let server = TestServer::new();

    let response = server.register("b@x.com", "weak").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "password is too weak");
    assert_eq!(response.body["strength"], "weak");

    let details = response.body["details"].as_array().expect("details");
    assert!(details.contains(&json!("must be at least 8 characters")));
    assert!(details.contains(&json!("must contain an uppercase letter")));
    assert!(details.contains(&json!("must contain a digit")));
    assert!(details.contains(&json!("must contain a symbol")));
    assert!(!details.contains(&json!("must contain a lowercase letter")));

    assert_eq!(server.store.find_by_identity("b@x.com"), Ok(None));
}

#[tokio::test]
async fn test_register_stores_only_a_hash() {
    let server = TestServer::new();
    server.register(EMAIL, PASSWORD).await;

    let credential = server
        .store
        .find_by_identity(EMAIL)
        .expect("find")
        .expect("stored");
    assert_ne!(credential.secret_hash, PASSWORD);
    assert!(credential.secret_hash.starts_with("$2"));
}

#[tokio::test]
async fn test_register_empty_fields() {
    let server = TestServer::new();

    assert_eq!(
        server.register("", PASSWORD).await.status,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        server.register(EMAIL, "").await.status,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_register_missing_field_rejected() {
    let server = TestServer::new();

    let response = server
        .send(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({ "email": EMAIL })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body, json!({ "error": "invalid request body" }));
    assert!(server.store.is_empty().expect("is_empty"));
}

#[tokio::test]
async fn test_register_password_over_72_bytes_rejected() {
    let server = TestServer::new();
    let prefix = "Aa1!".repeat(18);

    let response = server
        .register(EMAIL, &format!("{prefix}first-secret"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"], json!(["must be at most 72 bytes"]));
    assert!(server.store.is_empty().expect("is_empty"));

    // The 72-byte prefix on its own is fine, and a longer password sharing
    // it cannot log in as that account.
    assert_eq!(
        server.register(EMAIL, &prefix).await.status,
        StatusCode::CREATED
    );
    assert_eq!(
        server
            .login(EMAIL, &format!("{prefix}totally-different"))
            .await
            .status,
        StatusCode::UNAUTHORIZED
    );
}
