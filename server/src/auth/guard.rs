//! Bearer-token request authentication.
//!
//! The guard turns a raw authorization header into a `Principal`. It knows
//! nothing about the transport: callers hand it header text and map
//! `Unauthenticated` to whatever rejection their protocol uses.
//!
//! # Invariants
//! - Fail-closed: anything other than one well-formed `Bearer <token>` header
//!   carrying a valid, unexpired token is `Unauthenticated`.
//! - Pure: the same header and an unexpired token always yield the same `Principal`.

use std::sync::Arc;

use super::token::TokenCodec;

/// Name of the header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Authentication scheme required in the authorization header.
pub const BEARER_SCHEME: &str = "Bearer";

/// The verified identity behind one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Identity from the token's subject claim.
    pub identity: String,
    /// When the backing token expires, seconds since the Unix epoch.
    pub expires_at: u64,
}

/// The request could not be authenticated.
///
/// Carries no reason; the transport boundary must answer with a generic rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unauthenticated;

impl std::fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unauthenticated")
    }
}

impl std::error::Error for Unauthenticated {}

/// Extract the token from a `Bearer <token>` header value.
///
/// The scheme word is matched case-insensitively. Exactly one space must
/// separate it from a non-empty token that contains no whitespace.
#[must_use]
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, token) = header_value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Server-side request authenticator.
#[derive(Clone)]
pub struct AuthGuard {
    codec: Arc<TokenCodec>,
}

impl AuthGuard {
    #[must_use]
    pub const fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// Authenticate from the raw authorization header value, if any.
    ///
    /// # Errors
    /// Returns `Unauthenticated` if the header is missing, does not use the
    /// bearer scheme, or carries a token that fails verification.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, Unauthenticated> {
        let Some(value) = authorization else {
            tracing::debug!("request rejected: no authorization header");
            return Err(Unauthenticated);
        };
        let Some(token) = bearer_token(value) else {
            tracing::debug!("request rejected: authorization header is not a bearer credential");
            return Err(Unauthenticated);
        };
        let claims = self.codec.verify(token).map_err(|_| Unauthenticated)?;

        Ok(Principal {
            identity: claims.identity,
            expires_at: claims.expires_at,
        })
    }

    /// Authenticate from raw `(name, value)` header pairs.
    ///
    /// The authorization header is matched regardless of name casing. More than
    /// one authorization header is treated as ambiguous and rejected.
    ///
    /// # Errors
    /// Same as [`AuthGuard::authenticate`].
    pub fn authenticate_headers<'a, I>(&self, headers: I) -> Result<Principal, Unauthenticated>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut values = headers
            .into_iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION_HEADER))
            .map(|(_, value)| value);

        let first = values.next();
        if values.next().is_some() {
            tracing::debug!("request rejected: multiple authorization headers");
            return Err(Unauthenticated);
        }
        self.authenticate(first)
    }
}
