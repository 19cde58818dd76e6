use std::convert::Infallible;

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{Role, SessionUser},
};

/// Claims
///
/// Payload of a session token. Tokens are issued at login elsewhere; this service
/// only verifies them. Admin tokens carry `name`, college tokens carry `collegeName`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "collegeName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub college_name: Option<String>,
    /// Issued At (iat).
    #[serde(default)]
    pub iat: usize,
    /// Expiration Time (exp). Always validated.
    pub exp: usize,
}

impl Claims {
    /// The display name regardless of account kind.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.college_name.as_deref())
    }
}

/// Why a token was rejected. Callers collapse all of these into "unauthenticated".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed")]
    Malformed,
}

/// TokenVerifier
///
/// Decodes and validates HS256 session tokens against the configured secret.
/// Pure: no I/O, no state beyond the key.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            })
    }
}

/// Credential
///
/// The raw session token presented with a request, independent of how it travelled.
/// The session cookie wins; an `Authorization: Bearer` header is the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }

    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(cookie_name) {
            let value = cookie.value().trim();
            if !value.is_empty() {
                return Self::new(value);
            }
        }

        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Runs the credential through the verifier, mapping every failure to a 401.
    pub fn authenticate(&self, verifier: &TokenVerifier) -> Result<AuthUser, ApiError> {
        let token = self.token().ok_or(ApiError::AuthenticationMissing)?;

        match verifier.verify(token) {
            Ok(claims) => Ok(AuthUser::from(claims)),
            Err(reason) => {
                tracing::debug!(%reason, "rejecting session token");
                Err(ApiError::AuthenticationInvalid("Invalid or expired token"))
            }
        }
    }
}

impl<S> FromRequestParts<S> for Credential
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        Ok(Credential::from_headers(&parts.headers, &config.cookie_name))
    }
}

/// AuthUser
///
/// The verified identity of the caller, built from token claims alone. Handlers
/// that need a particular role call `require_role` before touching the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub name: Option<String>,
}

impl AuthUser {
    /// A valid token of the wrong role is still unauthenticated for the route.
    pub fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.id, actual = %self.role, required = %role, "role mismatch");
            Err(ApiError::AuthenticationInvalid("Unauthorized"))
        }
    }

    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            name: self.name.clone(),
        }
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        let name = claims.display_name().map(str::to_string);
        AuthUser {
            id: claims.id,
            email: claims.email,
            role: claims.role,
            name,
        }
    }
}

/// Rejection: `ApiError::AuthenticationMissing` or `ApiError::AuthenticationInvalid`,
/// both rendered as 401 with a message body.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
    TokenVerifier: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let verifier = TokenVerifier::from_ref(state);

        Credential::from_headers(&parts.headers, &config.cookie_name).authenticate(&verifier)
    }
}

/// Hashes a plaintext password into an argon2id PHC string for storage.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}
