//! The authentication kernel: credential verification, token pair issuance,
//! refresh rotation with reuse detection, and the request-time auth gate.
//!
//! Every operation is an independent unit of work against the account store;
//! the only shared mutable state is the single stored refresh token per
//! account, and all writes to it go through the store's atomic primitives.
use std::sync::Arc;

use uuid::Uuid;

use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User, UserProfile};
use crate::security::jwt::{self, JwtKeys};
use crate::security::password;

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        AuthService { store, keys }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    /// Create an account. Conflicts on username or email are checked up
    /// front; the store's unique constraints back this up under races.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        full_name: &str,
        plain_password: &str,
        avatar_url: String,
        cover_image_url: Option<String>,
    ) -> Result<UserProfile> {
        let username = username.to_lowercase();
        let email = email.to_lowercase();

        if self.store.find_by_identifier(&username).await?.is_some()
            || self.store.find_by_identifier(&email).await?.is_some()
        {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let password_hash = password::hash_password(plain_password)?;

        let user = self
            .store
            .create(&NewUser {
                username,
                email,
                full_name: full_name.to_string(),
                avatar_url,
                cover_image_url,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user.into())
    }

    /// Verify credentials, mint a pair, and persist the refresh token as the
    /// account's single outstanding value.
    pub async fn login(&self, identifier: &str, plain_password: &str) -> Result<LoginOutcome> {
        let user = self
            .store
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !password::verify_password(plain_password, &user.password_hash) {
            return Err(AppError::CredentialMismatch);
        }

        let pair = self.issue_pair(&user)?;
        self.store
            .set_refresh_token(user.id, Some(&pair.refresh_token))
            .await?;

        tracing::info!(user_id = %user.id, "user logged in");

        Ok(LoginOutcome {
            user: user.into(),
            tokens: pair,
        })
    }

    /// Exchange a valid, non-superseded refresh token for a new pair.
    ///
    /// The match against the stored value and the overwrite happen as one
    /// conditional store update; a failed condition means the token was
    /// already rotated or cleared and is reported as `TokenReused`.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair> {
        let presented = presented.ok_or(AppError::Unauthenticated)?;

        let claims = jwt::verify_refresh_token(&self.keys, presented)?;
        let user_id = jwt::subject_id(&claims.sub)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::InvalidToken("unknown subject".to_string()))?;

        let pair = self.issue_pair(&user)?;
        let rotated = self
            .store
            .rotate_refresh_token(user.id, presented, &pair.refresh_token)
            .await?;

        if !rotated {
            // The presented token verified but no longer matches the stored
            // value: either it already rotated, or this is a replay of a
            // superseded token.
            tracing::warn!(user_id = %user.id, "refresh token reuse detected");
            return Err(AppError::TokenReused);
        }

        tracing::debug!(user_id = %user.id, "refresh token rotated");
        Ok(pair)
    }

    /// Clear the stored refresh token. Every previously issued refresh token
    /// for this account fails rotation afterwards, until the next login.
    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        self.store.set_refresh_token(user_id, None).await?;
        tracing::info!(%user_id, "user logged out");
        Ok(())
    }

    /// The auth gate: resolve a presented access token to a live account.
    /// Read-only; performs no token mutation.
    pub async fn authenticate(&self, presented: Option<&str>) -> Result<UserProfile> {
        let token = presented.ok_or(AppError::Unauthenticated)?;

        let claims = jwt::verify_access_token(&self.keys, token)?;
        let user_id = jwt::subject_id(&claims.sub)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UnknownSubject)?;

        Ok(user.into())
    }

    /// Verify the old secret and store a hash of the new one.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UnknownSubject)?;

        if !password::verify_password(old_password, &user.password_hash) {
            return Err(AppError::CredentialMismatch);
        }

        let new_hash = password::hash_password(new_password)?;
        self.store.update_password(user.id, &new_hash).await?;

        tracing::info!(%user_id, "password changed");
        Ok(())
    }

    fn issue_pair(&self, user: &User) -> Result<TokenPair> {
        let access_token = jwt::issue_access_token(&self.keys, user)?;
        let refresh_token = jwt::issue_refresh_token(&self.keys, user.id)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}

/// What a successful login hands back to the transport layer.
#[derive(Debug)]
pub struct LoginOutcome {
    pub user: UserProfile,
    pub tokens: TokenPair,
}
