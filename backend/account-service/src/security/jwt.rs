//! Token issuance and verification.
//!
//! Two token kinds with independent signing secrets: short-lived access
//! tokens carrying the profile claims, and long-lived refresh tokens carrying
//! the subject id only. Key material lives in an explicit [`JwtKeys`] value
//! built once at startup and passed to every call site, so the whole module
//! is testable with injected secrets.
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, Result};
use crate::models::User;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claims embedded in an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (account ID)
    pub sub: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub token_type: String,
}

/// Claims embedded in a refresh token. Subject only: the longer-lived token
/// exposes as little as possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: String,
}

/// Signing and verification material for both token kinds.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl JwtKeys {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        JwtKeys {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Build keys from validated configuration. Must be called during
    /// startup; a bad secret aborts there.
    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        ))
    }
}

/// Mint an access token for a resolved account.
pub fn issue_access_token(keys: &JwtKeys, user: &User) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::seconds(keys.access_ttl_secs);

    let claims = AccessClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        token_type: TOKEN_TYPE_ACCESS.to_string(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.access_encoding)
        .map_err(|_| AppError::Internal("Failed to sign access token".to_string()))
}

/// Mint a refresh token bound to a subject. Does not persist anything;
/// the caller writes the value into the account's session state.
pub fn issue_refresh_token(keys: &JwtKeys, user_id: Uuid) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::seconds(keys.refresh_ttl_secs);

    let claims = RefreshClaims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        token_type: TOKEN_TYPE_REFRESH.to_string(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &keys.refresh_encoding,
    )
    .map_err(|_| AppError::Internal("Failed to sign refresh token".to_string()))
}

/// Verify signature and expiry of an access token and return its claims.
pub fn verify_access_token(keys: &JwtKeys, token: &str) -> Result<AccessClaims> {
    let data = decode::<AccessClaims>(
        token,
        &keys.access_decoding,
        &Validation::new(Algorithm::HS256),
    )?;
    if data.claims.token_type != TOKEN_TYPE_ACCESS {
        return Err(AppError::InvalidToken("unexpected token kind".to_string()));
    }
    Ok(data.claims)
}

/// Verify signature and expiry of a refresh token and return its claims.
pub fn verify_refresh_token(keys: &JwtKeys, token: &str) -> Result<RefreshClaims> {
    let data = decode::<RefreshClaims>(
        token,
        &keys.refresh_decoding,
        &Validation::new(Algorithm::HS256),
    )?;
    if data.claims.token_type != TOKEN_TYPE_REFRESH {
        return Err(AppError::InvalidToken("unexpected token kind".to_string()));
    }
    Ok(data.claims)
}

/// Parse the `sub` claim back into an account id.
pub fn subject_id(sub: &str) -> Result<Uuid> {
    Uuid::parse_str(sub).map_err(|_| AppError::InvalidToken("invalid subject id".to_string()))
}
