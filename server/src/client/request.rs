//! Outgoing request decoration.

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, HeaderValue};

use super::session::{SessionError, SessionStore};
use crate::auth::guard::BEARER_SCHEME;

/// Format a token as an authorization header value.
#[must_use]
pub fn bearer_header_value(token: &str) -> String {
    format!("{BEARER_SCHEME} {token}")
}

/// Attach `Authorization: Bearer <token>` when the client holds a session.
///
/// Returns whether a header was attached. Any existing authorization header
/// is replaced; with no session it is removed.
pub fn attach_bearer<S: SessionStore + ?Sized>(
    store: &S,
    headers: &mut HeaderMap,
) -> Result<bool, SessionError> {
    let Some(token) = store.get()? else {
        headers.remove(AUTHORIZATION);
        return Ok(false);
    };

    match HeaderValue::from_str(&bearer_header_value(&token)) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
            Ok(true)
        }
        Err(e) => {
            tracing::warn!("stored session token is not a valid header value: {e}");
            headers.remove(AUTHORIZATION);
            Ok(false)
        }
    }
}
