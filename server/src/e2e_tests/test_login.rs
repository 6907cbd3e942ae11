//! Login scenarios.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_login_returns_bearer_token() {
    let server = TestServer::new();
    server.register(EMAIL, PASSWORD).await;

    let response = server.login(EMAIL, PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["token_type"], "bearer");
    assert_eq!(response.body["expires_at"], START + 3600);

    let token = response.body["access_token"].as_str().expect("token");
    assert_eq!(token.split('.').count(), 3);

    let claims = server.codec.verify(token).expect("verify");
    assert_eq!(claims.identity, EMAIL);
    assert_eq!(claims.issued_at, START);
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_look_the_same() {
    let server = TestServer::new();
    server.register(EMAIL, PASSWORD).await;

    let unknown = server.login("nobody@x.com", PASSWORD).await;
    let wrong = server.login(EMAIL, "Wr0ng!pass").await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status, wrong.status);
    assert_eq!(unknown.body, wrong.body);
}

#[tokio::test]
async fn test_each_login_issues_an_independent_token() {
    let server = TestServer::new();
    let first = server.registered_token().await;

    server.clock.advance(10);
    let response = server.login(EMAIL, PASSWORD).await;
    let second = response.body["access_token"].as_str().expect("token");

    assert_ne!(first, second);
    assert_eq!(server.me(Some(&bearer(&first))).await.status, StatusCode::OK);
    assert_eq!(server.me(Some(&bearer(second))).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_bad_bodies_get_generic_400() {
    let server = TestServer::new();
    server.register(EMAIL, PASSWORD).await;

    let missing_field = server
        .send(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": EMAIL })),
            None,
        )
        .await;
    let wrong_type = server
        .send(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": EMAIL, "password": 12_345_678 })),
            None,
        )
        .await;
    let not_json = server
        .send_request(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/login")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from("{email"))
                .expect("request"),
        )
        .await;
    let no_content_type = server
        .send_request(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/login")
                .body(Body::from(json!({ "email": EMAIL, "password": PASSWORD }).to_string()))
                .expect("request"),
        )
        .await;

    for response in [missing_field, wrong_type, not_json, no_content_type] {
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.body, json!({ "error": "invalid request body" }));
    }
}

#[tokio::test]
async fn test_login_empty_password() {
    let server = TestServer::new();
    server.register(EMAIL, PASSWORD).await;

    assert_eq!(server.login(EMAIL, "").await.status, StatusCode::BAD_REQUEST);
}
