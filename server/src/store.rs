//! User-record storage.
//!
//! `UserStore` is the seam a real database plugs into. `MemoryUserStore` is
//! the in-process implementation used by the server binary and tests.
//!
//! # Invariants
//! - At most one credential exists per identity.
//! - `create` checks for an existing identity and inserts atomically.

use std::collections::HashMap;
use std::sync::RwLock;

/// Stored identity and password hash.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub secret_hash: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("secret_hash", &"<redacted>")
            .finish()
    }
}

/// Errors raised by a user store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A credential already exists for the identity.
    DuplicateIdentity,
    /// The store lock was poisoned by a panicking writer.
    LockPoisoned,
    /// Backend-specific failure.
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateIdentity => write!(f, "identity already registered"),
            Self::LockPoisoned => write!(f, "user store lock poisoned"),
            Self::Backend(message) => write!(f, "user store error: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistent user records.
///
/// # Thread Safety
///
/// Implementations must be safe to share across request handlers, and
/// `create` must not let two concurrent calls for the same identity both succeed.
pub trait UserStore: Send + Sync {
    /// Look up the credential for `identity`.
    fn find_by_identity(&self, identity: &str) -> Result<Option<Credential>, StoreError>;

    /// Insert a new credential.
    ///
    /// # Errors
    /// Returns `StoreError::DuplicateIdentity` if `identity` already exists.
    fn create(&self, identity: &str, secret_hash: &str) -> Result<(), StoreError>;

    /// Remove the credential for `identity`. Returns whether one existed.
    fn delete(&self, identity: &str) -> Result<bool, StoreError>;
}

/// In-memory user store keyed by identity.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, String>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    pub fn len(&self) -> Result<usize, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(users.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl UserStore for MemoryUserStore {
    fn find_by_identity(&self, identity: &str) -> Result<Option<Credential>, StoreError> {
        let users = self.users.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(users.get(identity).map(|secret_hash| Credential {
            identity: identity.to_string(),
            secret_hash: secret_hash.clone(),
        }))
    }

    fn create(&self, identity: &str, secret_hash: &str) -> Result<(), StoreError> {
        // Check and insert under one write lock so concurrent registrations serialize.
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;
        if users.contains_key(identity) {
            return Err(StoreError::DuplicateIdentity);
        }
        users.insert(identity.to_string(), secret_hash.to_string());
        Ok(())
    }

    fn delete(&self, identity: &str) -> Result<bool, StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(users.remove(identity).is_some())
    }
}
