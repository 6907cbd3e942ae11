//! Client-side route guards.
//!
//! Guards only look at whether a token is present. The server remains the
//! authority on whether that token is still valid.
//!
//! # Invariants
//! - A session store that cannot be read counts as logged out.

use super::session::{SessionError, SessionStore};

/// Where unauthenticated users are sent.
pub const LOGIN_ROUTE: &str = "/login";

/// Where authenticated users land.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Outcome of a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Render the requested route.
    Proceed,
    /// Go to another route instead.
    Redirect(&'static str),
}

/// Whether the client currently holds a session token.
pub fn is_authenticated<S: SessionStore + ?Sized>(store: &S) -> bool {
    match store.get() {
        Ok(token) => token.is_some(),
        Err(e) => {
            tracing::warn!("session store unreadable, treating as logged out: {e}");
            false
        }
    }
}

/// Guard for protected pages: no token sends the user to the login page.
pub fn require_session<S: SessionStore + ?Sized>(store: &S) -> Navigation {
    if is_authenticated(store) {
        Navigation::Proceed
    } else {
        Navigation::Redirect(LOGIN_ROUTE)
    }
}

/// Guard for the login page: an existing token skips straight to the dashboard.
pub fn redirect_if_authenticated<S: SessionStore + ?Sized>(store: &S) -> Navigation {
    if is_authenticated(store) {
        Navigation::Redirect(DASHBOARD_ROUTE)
    } else {
        Navigation::Proceed
    }
}

/// Record a token returned by a successful login.
pub fn complete_login<S: SessionStore + ?Sized>(
    store: &S,
    token: &str,
) -> Result<Navigation, SessionError> {
    store.set(token)?;
    Ok(Navigation::Redirect(DASHBOARD_ROUTE))
}

/// Drop the local session and return to the login page.
///
/// The token itself stays valid on the server until it expires.
pub fn logout<S: SessionStore + ?Sized>(store: &S) -> Result<Navigation, SessionError> {
    store.clear()?;
    Ok(Navigation::Redirect(LOGIN_ROUTE))
}
