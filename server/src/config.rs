//! Server configuration module.
//!
//! This module loads the auth server's configuration from environment
//! variables.
//!
//! # Environment Variables
//!
//! - `GARAGE_SECRET_KEY`: Token signing secret (required)
//! - `GARAGE_TOKEN_TTL_SECONDS`: Token lifetime in seconds (default: `3600`)
//! - `GARAGE_HASH_COST`: bcrypt cost, 4-31 (default: `10`)
//! - `GARAGE_LISTEN_PORT`: Port to listen on (default: `8100`)
//! - `GARAGE_PASSWORD_FEEDBACK`: `informative` or `opaque` (default: `informative`)
//! - `GARAGE_ALLOWED_ORIGINS`: Comma-separated browser origins allowed to call
//!   the API (default: the local frontend dev server origins). Empty disables CORS.
//!
//! # Invariants
//!
//! - A loaded configuration always has a non-empty secret and a non-zero lifetime
//! - `hasher` always holds a cost bcrypt accepts

use axum::http::HeaderValue;

use crate::auth::{AuthFlowConfig, HasherConfig, PasswordFeedback, TokenConfig};

const SECRET_KEY_VAR: &str = "GARAGE_SECRET_KEY";
const TOKEN_TTL_VAR: &str = "GARAGE_TOKEN_TTL_SECONDS";
const HASH_COST_VAR: &str = "GARAGE_HASH_COST";
const LISTEN_PORT_VAR: &str = "GARAGE_LISTEN_PORT";
const PASSWORD_FEEDBACK_VAR: &str = "GARAGE_PASSWORD_FEEDBACK";
const ALLOWED_ORIGINS_VAR: &str = "GARAGE_ALLOWED_ORIGINS";

/// Server configuration.
///
/// # Post-conditions
///
/// When constructed via `from_env()` every component config has passed its
/// own validation.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Signing secret and lifetime for session tokens.
    pub token: TokenConfig,
    /// Work factor for password hashing.
    pub hasher: HasherConfig,
    /// Registration/login policy.
    pub flow: AuthFlowConfig,
    /// Port to listen on for HTTP requests.
    pub listen_port: u16,
    /// Origins allowed to make cross-origin requests.
    pub allowed_origins: Vec<HeaderValue>,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable is missing.
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnvVar(name) => {
                write!(f, "missing required environment variable: {name}")
            }
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

fn invalid(name: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.into(),
    }
}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 8100;

    /// Origins of the frontend dev server.
    pub const DEFAULT_ALLOWED_ORIGINS: [&'static str; 4] = [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://localhost",
        "http://127.0.0.1",
    ];

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `GARAGE_SECRET_KEY` is not set or is empty
    /// - any optional variable is set to a value that does not parse or validate
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = Self::load_secret(&lookup)?;
        let ttl_secs = Self::load_number(&lookup, TOKEN_TTL_VAR, TokenConfig::DEFAULT_TTL_SECS)?;
        let token = TokenConfig::with_ttl(secret, ttl_secs)
            .map_err(|e| invalid(TOKEN_TTL_VAR, e.to_string()))?;

        let cost = Self::load_number(&lookup, HASH_COST_VAR, HasherConfig::DEFAULT_COST)?;
        let hasher = HasherConfig::new(cost).map_err(|e| invalid(HASH_COST_VAR, e.to_string()))?;

        let listen_port = Self::load_number(&lookup, LISTEN_PORT_VAR, Self::DEFAULT_PORT)?;
        if listen_port == 0 {
            return Err(invalid(LISTEN_PORT_VAR, "port must be 1-65535"));
        }

        let password_feedback = Self::load_password_feedback(&lookup)?;
        let allowed_origins = Self::load_allowed_origins(&lookup)?;

        Ok(Self {
            token,
            hasher,
            flow: AuthFlowConfig { password_feedback },
            listen_port,
            allowed_origins,
        })
    }

    /// Load the signing secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is not set or is empty.
    fn load_secret<F>(lookup: &F) -> Result<Vec<u8>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(SECRET_KEY_VAR)
            .ok_or_else(|| ConfigError::MissingEnvVar(SECRET_KEY_VAR.to_string()))?;

        if secret.is_empty() {
            return Err(invalid(SECRET_KEY_VAR, "must not be empty"));
        }

        Ok(secret.into_bytes())
    }

    /// Load a numeric variable, falling back to `default` when unset.
    fn load_number<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
        T: std::str::FromStr,
    {
        match lookup(name) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|_| invalid(name, format!("'{value}' is not a valid number"))),
            None => Ok(default),
        }
    }

    /// Load the CORS origin list.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry is `*` or is not a valid header value.
    fn load_allowed_origins<F>(lookup: &F) -> Result<Vec<HeaderValue>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(value) = lookup(ALLOWED_ORIGINS_VAR) else {
            return Ok(Self::DEFAULT_ALLOWED_ORIGINS
                .into_iter()
                .map(HeaderValue::from_static)
                .collect());
        };

        value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                if origin == "*" {
                    return Err(invalid(
                        ALLOWED_ORIGINS_VAR,
                        "wildcard origin is not allowed with credentials",
                    ));
                }
                HeaderValue::from_str(origin).map_err(|_| {
                    invalid(
                        ALLOWED_ORIGINS_VAR,
                        format!("'{origin}' is not a valid origin"),
                    )
                })
            })
            .collect()
    }

    fn load_password_feedback<F>(lookup: &F) -> Result<PasswordFeedback, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(PASSWORD_FEEDBACK_VAR).as_deref().map(str::trim) {
            None => Ok(PasswordFeedback::default()),
            Some(value) if value.eq_ignore_ascii_case("informative") => {
                Ok(PasswordFeedback::Informative)
            }
            Some(value) if value.eq_ignore_ascii_case("opaque") => Ok(PasswordFeedback::Opaque),
            Some(value) => Err(invalid(
                PASSWORD_FEEDBACK_VAR,
                format!("'{value}' must be 'informative' or 'opaque'"),
            )),
        }
    }
}
