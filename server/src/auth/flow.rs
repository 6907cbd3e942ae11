//! Registration and login orchestration.
//!
//! # Pre-conditions
//! - The user store enforces identity uniqueness in `create`.
//!
//! # Post-conditions
//! - A successful `register` leaves exactly one credential for the identity.
//! - A successful `login` returns a freshly signed token. Earlier tokens stay
//!   valid until they expire.
//!
//! # Invariants
//! - Passwords are hashed and verified on blocking worker threads, never on
//!   the async executor.
//! - Plaintext passwords are never stored or logged.

use std::sync::Arc;

use super::guard::Principal;
use super::password::{CredentialHasher, HashError};
use super::policy::{PasswordRule, check_strength};
use super::token::{IssuedToken, SigningError, TokenCodec};
use crate::store::{StoreError, UserStore};

/// How much detail a weak-password rejection carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordFeedback {
    /// Report which rules failed.
    #[default]
    Informative,
    /// Report only that the password was rejected.
    Opaque,
}

/// Policy knobs for `AuthFlow`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthFlowConfig {
    pub password_feedback: PasswordFeedback,
}

/// Error returned by `AuthFlow::register`.
#[derive(Debug)]
pub enum RegistrationError {
    /// The identity or password argument was empty.
    InvalidInput(&'static str),
    /// A credential already exists for the identity.
    DuplicateIdentity,
    /// The password failed the strength policy. Empty when feedback is opaque.
    WeakPassword(Vec<PasswordRule>),
    /// Hashing failed.
    Hashing(HashError),
    /// The user store failed.
    Storage(StoreError),
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Self::DuplicateIdentity => write!(f, "identity already registered"),
            Self::WeakPassword(rules) if rules.is_empty() => write!(f, "password is too weak"),
            Self::WeakPassword(rules) => {
                write!(f, "password is too weak: ")?;
                for (i, rule) in rules.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{rule}")?;
                }
                Ok(())
            }
            Self::Hashing(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hashing(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::InvalidInput(_) | Self::DuplicateIdentity | Self::WeakPassword(_) => None,
        }
    }
}

impl From<StoreError> for RegistrationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateIdentity => Self::DuplicateIdentity,
            other => Self::Storage(other),
        }
    }
}

impl From<HashError> for RegistrationError {
    fn from(e: HashError) -> Self {
        Self::Hashing(e)
    }
}

/// Error returned by `AuthFlow::login`.
#[derive(Debug)]
pub enum LoginError {
    /// The identity or password argument was empty.
    InvalidInput(&'static str),
    /// No credential exists for the identity.
    UserNotFound,
    /// The password does not match the stored credential.
    InvalidPassword,
    /// Password verification failed.
    Hashing(HashError),
    /// The token could not be signed.
    Signing(SigningError),
    /// The user store failed.
    Storage(StoreError),
}

impl std::fmt::Display for LoginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Self::UserNotFound => write!(f, "user not found"),
            Self::InvalidPassword => write!(f, "invalid password"),
            Self::Hashing(e) => write!(f, "{e}"),
            Self::Signing(e) => write!(f, "{e}"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hashing(e) => Some(e),
            Self::Signing(e) => Some(e),
            Self::Storage(e) => Some(e),
            Self::InvalidInput(_) | Self::UserNotFound | Self::InvalidPassword => None,
        }
    }
}

impl From<StoreError> for LoginError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

impl From<HashError> for LoginError {
    fn from(e: HashError) -> Self {
        Self::Hashing(e)
    }
}

impl From<SigningError> for LoginError {
    fn from(e: SigningError) -> Self {
        Self::Signing(e)
    }
}

/// Error returned by account operations on an authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// The principal's account no longer exists.
    UserNotFound,
    /// The user store failed.
    Storage(StoreError),
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound => write!(f, "user not found"),
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AccountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::UserNotFound => None,
        }
    }
}

impl From<StoreError> for AccountError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

/// Public view of a stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub identity: String,
}

/// Run a hashing operation on the blocking pool.
async fn run_blocking<T, F>(operation: F) -> Result<T, HashError>
where
    F: FnOnce() -> Result<T, HashError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|e| HashError::Worker(e.to_string()))?
}

/// Register/login/delete over a user store.
pub struct AuthFlow<S: ?Sized> {
    store: Arc<S>,
    hasher: CredentialHasher,
    codec: Arc<TokenCodec>,
    config: AuthFlowConfig,
}

impl<S: UserStore + ?Sized> AuthFlow<S> {
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        hasher: CredentialHasher,
        codec: Arc<TokenCodec>,
        config: AuthFlowConfig,
    ) -> Self {
        Self {
            store,
            hasher,
            codec,
            config,
        }
    }

    /// Create a credential for `identity`.
    ///
    /// # Errors
    /// - `InvalidInput` if either argument is empty.
    /// - `DuplicateIdentity` if the identity is taken, including when a
    ///   concurrent registration wins the race.
    /// - `WeakPassword` if the password fails the strength policy.
    pub async fn register(&self, identity: &str, password: &str) -> Result<(), RegistrationError> {
        if identity.is_empty() {
            return Err(RegistrationError::InvalidInput("identity must not be empty"));
        }
        if password.is_empty() {
            return Err(RegistrationError::InvalidInput("password must not be empty"));
        }
        if self.store.find_by_identity(identity)?.is_some() {
            tracing::info!("registration rejected for {identity}: already registered");
            return Err(RegistrationError::DuplicateIdentity);
        }
        if let Err(failed) = check_strength(password) {
            tracing::info!("registration rejected for {identity}: weak password");
            let detail = match self.config.password_feedback {
                PasswordFeedback::Informative => failed,
                PasswordFeedback::Opaque => Vec::new(),
            };
            return Err(RegistrationError::WeakPassword(detail));
        }

        let hasher = self.hasher;
        let password = password.to_string();
        let secret_hash = run_blocking(move || hasher.hash(&password)).await?;

        self.store.create(identity, &secret_hash).inspect_err(|e| {
            if !matches!(e, StoreError::DuplicateIdentity) {
                tracing::warn!("failed to store credential for {identity}: {e}");
            }
        })?;

        tracing::info!("registered {identity}");
        Ok(())
    }

    /// Check a password and issue a session token.
    ///
    /// # Errors
    /// - `InvalidInput` if either argument is empty.
    /// - `UserNotFound` if no credential exists.
    /// - `InvalidPassword` if the password does not match.
    pub async fn login(&self, identity: &str, password: &str) -> Result<IssuedToken, LoginError> {
        if identity.is_empty() {
            return Err(LoginError::InvalidInput("identity must not be empty"));
        }
        if password.is_empty() {
            return Err(LoginError::InvalidInput("password must not be empty"));
        }

        let Some(credential) = self.store.find_by_identity(identity)? else {
            tracing::info!("login failed for {identity}: unknown identity");
            return Err(LoginError::UserNotFound);
        };

        let hasher = self.hasher;
        let password = password.to_string();
        let secret_hash = credential.secret_hash;
        let matches = run_blocking(move || hasher.verify(&password, &secret_hash)).await?;
        if !matches {
            tracing::info!("login failed for {identity}: wrong password");
            return Err(LoginError::InvalidPassword);
        }

        let issued = self.codec.issue(identity)?;
        tracing::info!("login succeeded for {identity}");
        Ok(issued)
    }

    /// Look up the account behind an authenticated principal.
    ///
    /// # Errors
    /// Returns `AccountError::UserNotFound` if the account was deleted after
    /// the token was issued.
    pub fn account(&self, principal: &Principal) -> Result<Account, AccountError> {
        self.store
            .find_by_identity(&principal.identity)?
            .map(|credential| Account {
                identity: credential.identity,
            })
            .ok_or(AccountError::UserNotFound)
    }

    /// Delete the principal's credential.
    ///
    /// Tokens already issued for the identity stay valid until they expire.
    ///
    /// # Errors
    /// Returns `AccountError::UserNotFound` if there is nothing to delete.
    pub fn delete_account(&self, principal: &Principal) -> Result<(), AccountError> {
        if !self.store.delete(&principal.identity)? {
            return Err(AccountError::UserNotFound);
        }
        tracing::info!("deleted account {}", principal.identity);
        Ok(())
    }
}
