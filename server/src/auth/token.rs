//! Session token signing and verification.
//!
//! Tokens are compact HS256 JWTs: three dot-joined URL-safe base64 segments
//! (header, claims, signature). Claims are a fixed struct; unknown payload
//! fields are ignored and never surfaced to callers.
//!
//! # Pre-conditions
//! - The signing secret must be non-empty.
//!
//! # Post-conditions
//! - `verify` returns the exact claims that were signed, or an opaque `TokenError`.
//!
//! # Invariants
//! - Verification is stateless: there is no server-side record of issued tokens.
//! - A token is valid only while `now < expires_at`. There is no revoked state.
//! - Every verification failure looks the same to the caller.

use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

/// Error returned when token configuration is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenConfigError {
    /// The HS256 secret is empty.
    EmptySecret,
    /// The token lifetime is zero.
    ZeroLifetime,
}

impl std::fmt::Display for TokenConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "token signing secret must not be empty"),
            Self::ZeroLifetime => write!(f, "token lifetime must be greater than zero"),
        }
    }
}

impl std::error::Error for TokenConfigError {}

/// Signing key and lifetime for session tokens.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    ttl_secs: u64,
}

impl TokenConfig {
    /// Default token lifetime: one hour.
    pub const DEFAULT_TTL_SECS: u64 = 3600;

    /// Create a configuration with the default one hour lifetime.
    ///
    /// # Errors
    /// Returns `TokenConfigError::EmptySecret` if the secret is empty.
    pub fn new(secret: Vec<u8>) -> Result<Self, TokenConfigError> {
        Self::with_ttl(secret, Self::DEFAULT_TTL_SECS)
    }

    /// Create a configuration with an explicit lifetime in seconds.
    ///
    /// # Errors
    /// Returns `TokenConfigError::EmptySecret` if the secret is empty.
    /// Returns `TokenConfigError::ZeroLifetime` if `ttl_secs` is zero.
    pub fn with_ttl(secret: Vec<u8>, ttl_secs: u64) -> Result<Self, TokenConfigError> {
        if secret.is_empty() {
            return Err(TokenConfigError::EmptySecret);
        }
        if ttl_secs == 0 {
            return Err(TokenConfigError::ZeroLifetime);
        }
        Ok(Self { secret, ttl_secs })
    }

    #[must_use]
    pub const fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

/// Claims carried by a session token.
///
/// Serialized with the registered JWT claim names so tokens interoperate with
/// other JWT libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity the token was issued to.
    #[serde(rename = "sub")]
    pub identity: String,
    /// Issuance time, seconds since the Unix epoch.
    #[serde(rename = "iat")]
    pub issued_at: u64,
    /// Expiry time, seconds since the Unix epoch.
    #[serde(rename = "exp")]
    pub expires_at: u64,
}

/// A freshly signed token together with the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Error returned when a token cannot be signed.
#[derive(Debug)]
pub enum SigningError {
    /// The identity claim is empty.
    EmptyIdentity,
    /// The JWT encoder failed.
    Encoding(jsonwebtoken::errors::Error),
}

impl std::fmt::Display for SigningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentity => write!(f, "identity claim must not be empty"),
            Self::Encoding(e) => write!(f, "failed to sign token: {e}"),
        }
    }
}

impl std::error::Error for SigningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encoding(e) => Some(e),
            Self::EmptyIdentity => None,
        }
    }
}

/// Token verification failed.
///
/// Carries no reason: malformed, forged and expired tokens are
/// indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenError;

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid token")
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies HS256 session tokens.
///
/// # Thread Safety
///
/// Immutable after construction; share it behind an `Arc` across request handlers.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    ttl_secs: u64,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec that reads the system clock.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a codec with an explicit clock.
    #[must_use]
    pub fn with_clock(config: &TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock, with no leeway.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            header: Header::new(Algorithm::HS256),
            validation,
            ttl_secs: config.ttl_secs,
            clock,
        }
    }

    /// Issue a token for `identity`, valid from now for the configured lifetime.
    ///
    /// # Errors
    /// Returns `SigningError::EmptyIdentity` if `identity` is empty.
    pub fn issue(&self, identity: &str) -> Result<IssuedToken, SigningError> {
        let issued_at = self.clock.now_secs();
        let claims = Claims {
            identity: identity.to_string(),
            issued_at,
            expires_at: issued_at.saturating_add(self.ttl_secs),
        };
        let token = self.sign(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Sign explicit claims.
    ///
    /// # Errors
    /// Returns `SigningError::EmptyIdentity` if the identity claim is empty.
    /// Returns `SigningError::Encoding` if serialization or signing fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, SigningError> {
        if claims.identity.is_empty() {
            return Err(SigningError::EmptyIdentity);
        }
        encode(&self.header, claims, &self.encoding_key).map_err(SigningError::Encoding)
    }

    /// Verify a token and return its claims.
    ///
    /// Checks structure, algorithm, signature and expiry. The reason for a
    /// rejection is logged at debug level and never returned.
    ///
    /// # Errors
    /// Returns `TokenError` on any failure.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("token rejected: {e}");
                TokenError
            })?
            .claims;

        if claims.identity.is_empty() {
            tracing::debug!("token rejected: empty identity claim");
            return Err(TokenError);
        }

        let now = self.clock.now_secs();
        if now >= claims.expires_at {
            tracing::debug!(
                "token rejected: expired at {} (now {now})",
                claims.expires_at
            );
            return Err(TokenError);
        }

        Ok(claims)
    }
}
