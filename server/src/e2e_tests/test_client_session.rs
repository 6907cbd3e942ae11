//! Client session lifecycle against the live router.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};

use crate::client::{
    DASHBOARD_ROUTE, LOGIN_ROUTE, MemorySessionStore, Navigation, attach_bearer, complete_login,
    logout, redirect_if_authenticated, require_session,
};
use crate::e2e_tests::helpers::*;

fn me_request(store: &MemorySessionStore) -> Request<Body> {
    let mut request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/users/me")
        .body(Body::empty())
        .expect("request");
    attach_bearer(store, request.headers_mut()).expect("attach");
    request
}

#[tokio::test]
async fn test_login_store_decorate_logout() {
    let server = TestServer::new();
    let session = MemorySessionStore::new();

    assert_eq!(require_session(&session), Navigation::Redirect(LOGIN_ROUTE));
    assert_eq!(redirect_if_authenticated(&session), Navigation::Proceed);

    let token = server.registered_token().await;
    assert_eq!(
        complete_login(&session, &token).expect("store token"),
        Navigation::Redirect(DASHBOARD_ROUTE)
    );
    assert_eq!(require_session(&session), Navigation::Proceed);

    let response = server.send_request(me_request(&session)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], EMAIL);

    assert_eq!(
        logout(&session).expect("logout"),
        Navigation::Redirect(LOGIN_ROUTE)
    );
    let response = server.send_request(me_request(&session)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_does_not_revoke_token() {
    let server = TestServer::new();
    let session = MemorySessionStore::new();
    let token = server.registered_token().await;

    complete_login(&session, &token).expect("store token");
    logout(&session).expect("logout");

    // A copy of the token kept elsewhere is still honoured until it expires.
    assert_eq!(server.me(Some(&bearer(&token))).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_stale_client_token_rejected_by_server() {
    let server = TestServer::new();
    let session = MemorySessionStore::new();
    let token = server.registered_token().await;
    complete_login(&session, &token).expect("store token");

    server.clock.advance(3600);

    // The client still believes it is logged in; the server disagrees.
    assert_eq!(require_session(&session), Navigation::Proceed);
    let response = server.send_request(me_request(&session)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
