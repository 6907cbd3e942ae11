//! End-to-end tests at the HTTP request/response level.
//!
//! Each test file covers a specific scenario, driving the full router with a
//! pinned clock so token expiry is deterministic.

#![cfg(test)]


mod test_client_session;
mod test_delete_account;
mod test_login;
mod test_protected_routes;
mod test_register;
