//! Client-side session handling.
//!
//! Holds the token a client received at login, gates client routes on its
//! presence, and decorates outgoing requests with it.

pub mod navigation;
pub mod request;
pub mod session;

pub use navigation::{
    DASHBOARD_ROUTE, LOGIN_ROUTE, Navigation, complete_login, is_authenticated, logout,
    redirect_if_authenticated, require_session,
};
pub use request::{attach_bearer, bearer_header_value};
pub use session::{FileSessionStore, MemorySessionStore, SESSION_KEY, SessionError, SessionStore};
