// Life of a request:
// 1. Register: check policy -> hash on a blocking worker -> store credential
// 2. Login: look up credential -> verify on a blocking worker -> sign token
// 3. Protected route: bearer header -> verify token -> Principal -> handler
//
// No session state lives on the server. A token is valid until it expires.
//
// System components:
//  - Credential hasher (bcrypt)
//  - Token codec (HS256 JWT)
//  - Auth guard and auth flow
//  - User store
//  - Client session store, route guards and request decoration

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod http;
pub mod store;

#[cfg(test)]
mod e2e_tests;

pub use auth::{AuthFlow, AuthGuard, CredentialHasher, Principal, TokenCodec};
pub use store::{Credential, MemoryUserStore, UserStore};
