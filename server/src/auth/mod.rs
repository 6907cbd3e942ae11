//! Authentication module.
//!
//! Password hashing, session tokens, request authentication and the
//! register/login flow built on top of them.
//!
//! # Pre-conditions
//! - The token signing secret is configured and non-empty.
//!
//! # Post-conditions
//! - Hasher, codec and guard are immutable once constructed.
//!
//! # Invariants
//! - No server-side session state: a token is its own proof until it expires.

pub mod flow;
pub mod guard;
pub mod password;
pub mod policy;
pub mod token;

pub use flow::{
    Account, AccountError, AuthFlow, AuthFlowConfig, LoginError, PasswordFeedback,
    RegistrationError,
};
pub use guard::{AuthGuard, Principal, Unauthenticated, bearer_token};
pub use password::{
    CredentialHasher, HashError, HasherConfig, HasherConfigError, MAX_PASSWORD_BYTES,
};
pub use policy::{PasswordRule, StrengthLabel, check_strength, estimate_entropy};
pub use token::{
    Claims, IssuedToken, SigningError, TokenCodec, TokenConfig, TokenConfigError, TokenError,
};
