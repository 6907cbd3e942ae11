//! Bearer authentication on protected routes.

use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS,
    ACCESS_CONTROL_REQUEST_METHOD, CONTENT_SECURITY_POLICY, ORIGIN, STRICT_TRANSPORT_SECURITY,
    WWW_AUTHENTICATE, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::{Method, Request, StatusCode};

use crate::auth::{TokenCodec, TokenConfig};
use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_valid_token_yields_principal() {
    let server = TestServer::new();
    let token = server.registered_token().await;

    let response = server.me(Some(&bearer(&token))).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], EMAIL);
}

#[tokio::test]
async fn test_garbage_token_rejected() {
    let server = TestServer::new();

    let response = server.me(Some("Bearer garbage")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "invalid token");
    assert_eq!(
        response
            .headers
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
}

#[tokio::test]
async fn test_missing_header_rejected() {
    let server = TestServer::new();

    let response = server.me(None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "invalid token");
}

#[tokio::test]
async fn test_token_without_scheme_rejected() {
    let server = TestServer::new();
    let token = server.registered_token().await;

    for header in [token.clone(), format!("Basic {token}"), "Bearer ".to_string()] {
        let response = server.me(Some(&header)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "header {header:?}");
    }
}

#[tokio::test]
async fn test_all_rejections_share_one_body() {
    let server = TestServer::new();
    server.register(EMAIL, PASSWORD).await;
    let forged = {
        let config = TokenConfig::new(b"some-other-secret".to_vec()).expect("config");
        let codec = TokenCodec::with_clock(&config, server.clock.clone());
        codec.issue(EMAIL).expect("issue").token
    };

    let missing = server.me(None).await;
    let garbage = server.me(Some("Bearer garbage")).await;
    let tampered = server.me(Some(&bearer(&forged))).await;

    assert_eq!(missing.body, garbage.body);
    assert_eq!(garbage.body, tampered.body);
    assert_eq!(tampered.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_header_name_casing_is_ignored() {
    let server = TestServer::new();
    let token = server.registered_token().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/users/me")
        .header("authorization", bearer(&token))
        .body(Body::empty())
        .expect("request");

    let response = server.send_request(request).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let server = TestServer::new();

    for response in [server.me(None).await, server.register(EMAIL, PASSWORD).await] {
        assert_eq!(
            response
                .headers
                .get(X_FRAME_OPTIONS)
                .and_then(|v| v.to_str().ok()),
            Some("DENY")
        );
        assert_eq!(
            response
                .headers
                .get(X_CONTENT_TYPE_OPTIONS)
                .and_then(|v| v.to_str().ok()),
            Some("nosniff")
        );
        assert_eq!(
            response
                .headers
                .get(X_XSS_PROTECTION)
                .and_then(|v| v.to_str().ok()),
            Some("1; mode=block")
        );
        assert!(response.headers.contains_key(CONTENT_SECURITY_POLICY));
        assert!(response.headers.contains_key(STRICT_TRANSPORT_SECURITY));
    }
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/users/me")
        .header(ORIGIN, origin)
        .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn test_cors_preflight_from_frontend_origin() {
    let server = TestServer::new();

    let response = server.send_request(preflight("http://localhost:5173")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response
            .headers
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:5173")
    );
    assert_eq!(
        response
            .headers
            .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );
    assert!(response.headers.contains_key(X_FRAME_OPTIONS));
}

#[tokio::test]
async fn test_cors_unknown_origin_not_allowed() {
    let server = TestServer::new();

    let response = server
        .send_request(preflight("https://evil.example"))
        .await;
    assert!(!response.headers.contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_cors_actual_request_echoes_origin() {
    let server = TestServer::new();
    let token = server.registered_token().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/users/me")
        .header(ORIGIN, "http://127.0.0.1:5173")
        .header("authorization", bearer(&token))
        .body(Body::empty())
        .expect("request");
    let response = server.send_request(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response
            .headers
            .get(ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://127.0.0.1:5173")
    );
}
