//! One-way password hashing.
//!
//! Hashes are bcrypt strings in modular-crypt form (`$2b$<cost>$<salt+digest>`),
//! so each stored hash carries its own cost and salt and verification needs no
//! side table.
//!
//! # Invariants
//! - A stored hash is never the plaintext and cannot be reversed.
//! - Hashing the same password twice yields two different strings.
//! - Verification compares digests in constant time.
//! - Passwords longer than bcrypt's 72-byte input are refused, never truncated.

use bcrypt::BcryptError;

/// Longest password bcrypt digests in full, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Error returned by the credential hasher.
#[derive(Debug)]
pub enum HashError {
    /// The password or hash argument was empty, or the password is too long.
    InvalidInput(&'static str),
    /// The hashing backend failed.
    Backend(BcryptError),
    /// The blocking worker running the hash did not complete.
    Worker(String),
}

impl std::fmt::Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(what) => write!(f, "invalid input: {what}"),
            Self::Backend(e) => write!(f, "password hashing failed: {e}"),
            Self::Worker(reason) => write!(f, "password hashing worker failed: {reason}"),
        }
    }
}

impl std::error::Error for HashError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(e) => Some(e),
            Self::InvalidInput(_) | Self::Worker(_) => None,
        }
    }
}

/// Error returned when hasher configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HasherConfigError {
    /// The bcrypt cost is outside the supported range.
    CostOutOfRange(u32),
}

impl std::fmt::Display for HasherConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CostOutOfRange(cost) => write!(
                f,
                "hash cost {cost} is out of range ({}-{})",
                HasherConfig::MIN_COST,
                HasherConfig::MAX_COST
            ),
        }
    }
}

impl std::error::Error for HasherConfigError {}

/// Work factor for the credential hasher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    cost: u32,
}

impl HasherConfig {
    /// Default bcrypt cost. Roughly tens of milliseconds per hash on commodity hardware.
    pub const DEFAULT_COST: u32 = 10;
    pub const MIN_COST: u32 = 4;
    pub const MAX_COST: u32 = 31;

    /// Create a configuration with the given bcrypt cost.
    ///
    /// # Errors
    /// Returns `HasherConfigError::CostOutOfRange` if `cost` is not in `4..=31`.
    pub const fn new(cost: u32) -> Result<Self, HasherConfigError> {
        if cost < Self::MIN_COST || cost > Self::MAX_COST {
            return Err(HasherConfigError::CostOutOfRange(cost));
        }
        Ok(Self { cost })
    }

    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }
}

/// Salted, one-way password hasher.
///
/// Holds only its work factor, so it is cheap to clone into blocking workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialHasher {
    config: HasherConfig,
}

impl CredentialHasher {
    #[must_use]
    pub const fn new(config: HasherConfig) -> Self {
        Self { config }
    }

    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Returns `HashError::InvalidInput` if `password` is empty or longer than
    /// [`MAX_PASSWORD_BYTES`].
    /// Returns `HashError::Backend` if bcrypt fails.
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        if password.is_empty() {
            return Err(HashError::InvalidInput("password must not be empty"));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::InvalidInput("password must be at most 72 bytes"));
        }
        bcrypt::non_truncating_hash(password, self.config.cost()).map_err(HashError::Backend)
    }

    /// Check a password against a stored hash.
    ///
    /// A malformed `secret_hash` is reported as a mismatch, not an error. So is
    /// a password longer than [`MAX_PASSWORD_BYTES`], which `hash` never accepts.
    ///
    /// # Errors
    /// Returns `HashError::InvalidInput` if either argument is empty.
    pub fn verify(&self, password: &str, secret_hash: &str) -> Result<bool, HashError> {
        if password.is_empty() {
            return Err(HashError::InvalidInput("password must not be empty"));
        }
        if secret_hash.is_empty() {
            return Err(HashError::InvalidInput("password hash must not be empty"));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            tracing::debug!("password rejected: longer than {MAX_PASSWORD_BYTES} bytes");
            return Ok(false);
        }
        match bcrypt::non_truncating_verify(password, secret_hash) {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::debug!("stored password hash is malformed: {e}");
                Ok(false)
            }
        }
    }
}
