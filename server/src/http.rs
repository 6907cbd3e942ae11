//! HTTP boundary.
//!
//! Maps requests onto `AuthFlow` and `AuthGuard` and maps their errors onto
//! status codes. Authentication failures always produce the same generic body,
//! and malformed request bodies get a generic 400 rather than parser detail.
//!
//! # Routes
//!
//! - `POST /api/v1/auth/register` `{email, password}` -> 201
//! - `POST /api/v1/auth/login` `{email, password}` -> `{access_token, token_type, expires_at}`
//! - `GET /api/v1/users/me` (bearer) -> `{email}`
//! - `DELETE /api/v1/users/delete` (bearer) -> 200
//!
//! Every response carries the security headers. Browser origins listed in
//! `ServerConfig::allowed_origins` may call the API cross-origin.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, FromRequestParts, State};
use axum::http::header::{
    CONTENT_SECURITY_POLICY, STRICT_TRANSPORT_SECURITY, WWW_AUTHENTICATE, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::auth::{
    AccountError, AuthFlow, AuthGuard, CredentialHasher, LoginError, Principal, RegistrationError,
    StrengthLabel, TokenCodec,
};
use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::store::UserStore;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    flow: Arc<AuthFlow<dyn UserStore>>,
    guard: AuthGuard,
    allowed_origins: Arc<[HeaderValue]>,
}

impl AppState {
    /// State with no cross-origin access.
    #[must_use]
    pub fn new(flow: Arc<AuthFlow<dyn UserStore>>, guard: AuthGuard) -> Self {
        Self {
            flow,
            guard,
            allowed_origins: Arc::from([]),
        }
    }

    /// Allow browsers on these origins to call the API.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: &[HeaderValue]) -> Self {
        self.allowed_origins = Arc::from(origins);
        self
    }

    /// Wire up hasher, codec, guard and flow from configuration.
    #[must_use]
    pub fn from_config(
        config: &ServerConfig,
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let codec = Arc::new(TokenCodec::with_clock(&config.token, clock));
        let guard = AuthGuard::new(Arc::clone(&codec));
        let flow = AuthFlow::new(
            store,
            CredentialHasher::new(config.hasher),
            codec,
            config.flow,
        );
        Self::new(Arc::new(flow), guard).with_allowed_origins(&config.allowed_origins)
    }
}

impl FromRef<AppState> for AuthGuard {
    fn from_ref(state: &AppState) -> Self {
        state.guard.clone()
    }
}

const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (
        CONTENT_SECURITY_POLICY,
        "default-src 'self'; script-src 'self'",
    ),
    (X_FRAME_OPTIONS, "DENY"),
    (
        STRICT_TRANSPORT_SECURITY,
        "max-age=63072000; includeSubDomains; preload",
    ),
    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (X_XSS_PROTECTION, "1; mode=block"),
];

/// Build the router with all routes, CORS and response headers.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);
    let routes = Router::new()
        .route("/api/v1/auth/register", post(register))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/users/me", get(me))
        .route("/api/v1/users/delete", delete(delete_account))
        .layer(cors);

    // Outermost, so preflight answers get the headers too.
    SECURITY_HEADERS
        .into_iter()
        .fold(routes, |routes, (name, value)| {
            routes.layer(SetResponseHeaderLayer::overriding(
                name,
                HeaderValue::from_static(value),
            ))
        })
        .with_state(state)
}

/// Credentialed CORS for an explicit origin list. Methods and headers mirror
/// the preflight request.
fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.iter().cloned()))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Email and password submitted to register or log in.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    /// Strength label of a rejected password, when feedback is informative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<String>,
}

/// Errors surfaced to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    WeakPassword {
        details: Vec<String>,
        strength: Option<StrengthLabel>,
    },
    Conflict,
    InvalidCredentials,
    Unauthenticated,
    NotFound,
    Internal,
}

impl ApiError {
    fn status_and_body(self) -> (StatusCode, ErrorResponse) {
        let mut strength = None;
        let (status, error, details) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message, Vec::new()),
            Self::WeakPassword {
                details,
                strength: label,
            } => {
                strength = label.map(|label| label.to_string());
                (
                    StatusCode::BAD_REQUEST,
                    "password is too weak".to_string(),
                    details,
                )
            }
            Self::Conflict => (
                StatusCode::CONFLICT,
                "email already registered".to_string(),
                Vec::new(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "incorrect email or password".to_string(),
                Vec::new(),
            ),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "invalid token".to_string(),
                Vec::new(),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                "user not found".to_string(),
                Vec::new(),
            ),
            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
                Vec::new(),
            ),
        };
        (
            status,
            ErrorResponse {
                error,
                details,
                strength,
            },
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let challenge = matches!(self, Self::Unauthenticated);
        let (status, body) = self.status_and_body();
        let mut response = (status, Json(body)).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::InvalidInput(what) => Self::BadRequest(what.to_string()),
            RegistrationError::DuplicateIdentity => Self::Conflict,
            RegistrationError::WeakPassword(rules) => Self::WeakPassword {
                details: rules.iter().map(ToString::to_string).collect(),
                strength: None,
            },
            RegistrationError::Hashing(_) | RegistrationError::Storage(_) => {
                tracing::error!("registration failed: {e}");
                Self::Internal
            }
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::InvalidInput(what) => Self::BadRequest(what.to_string()),
            LoginError::UserNotFound | LoginError::InvalidPassword => Self::InvalidCredentials,
            LoginError::Hashing(_) | LoginError::Signing(_) | LoginError::Storage(_) => {
                tracing::error!("login failed: {e}");
                Self::Internal
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::UserNotFound => Self::NotFound,
            AccountError::Storage(_) => {
                tracing::error!("account operation failed: {e}");
                Self::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        tracing::debug!("request body rejected: {e}");
        Self::BadRequest("invalid request body".to_string())
    }
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    AuthGuard: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = AuthGuard::from_ref(state);
        // Non-UTF-8 values stay in the sequence as empty text so they still fail closed.
        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_str().unwrap_or_default()));
        guard
            .authenticate_headers(headers)
            .map_err(|_| ApiError::Unauthenticated)
    }
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let Json(body) = body?;
    state
        .flow
        .register(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            RegistrationError::WeakPassword(rules) if !rules.is_empty() => ApiError::WeakPassword {
                details: rules.iter().map(ToString::to_string).collect(),
                strength: Some(StrengthLabel::of(&body.password)),
            },
            other => other.into(),
        })?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "registration successful".to_string(),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(body) = body?;
    let issued = state.flow.login(&body.email, &body.password).await?;
    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "bearer".to_string(),
        expires_at: issued.claims.expires_at,
    }))
}

async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.flow.account(&principal)?;
    Ok(Json(AccountResponse {
        email: account.identity,
    }))
}

async fn delete_account(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<MessageResponse>, ApiError> {
    state.flow.delete_account(&principal)?;
    Ok(Json(MessageResponse {
        message: format!("user {} deleted", principal.identity),
    }))
}
