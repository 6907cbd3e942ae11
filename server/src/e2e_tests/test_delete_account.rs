//! Account deletion and its effect on outstanding tokens.

use axum::http::{Method, StatusCode};

use crate::e2e_tests::helpers::*;

#[tokio::test]
async fn test_delete_account() {
    let server = TestServer::new();
    let token = server.registered_token().await;
    let header = bearer(&token);

    let deleted = server
        .send(Method::DELETE, "/api/v1/users/delete", None, Some(&header))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert!(server.store.is_empty().expect("is_empty"));

    // The token still authenticates, but the account is gone.
    assert_eq!(server.me(Some(&header)).await.status, StatusCode::NOT_FOUND);
    let again = server
        .send(Method::DELETE, "/api/v1/users/delete", None, Some(&header))
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    assert_eq!(
        server.login(EMAIL, PASSWORD).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_delete_requires_authentication() {
    let server = TestServer::new();
    server.register(EMAIL, PASSWORD).await;

    let response = server
        .send(Method::DELETE, "/api/v1/users/delete", None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(server.store.len().expect("len"), 1);
}

#[tokio::test]
async fn test_email_can_register_again_after_delete() {
    let server = TestServer::new();
    let token = server.registered_token().await;
    server
        .send(
            Method::DELETE,
            "/api/v1/users/delete",
            None,
            Some(&bearer(&token)),
        )
        .await;

    assert_eq!(
        server.register(EMAIL, PASSWORD).await.status,
        StatusCode::CREATED
    );
}
