pub mod user_repo;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{NewUser, User};

/// Create the database connection pool
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Run pending sqlx migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))?;

    Ok(())
}

/// Persistent account store as seen by the kernel. The store owns the account
/// lifecycle; the kernel only reads rows and updates the credential hash and
/// the single outstanding refresh token.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: &NewUser) -> Result<User>;

    /// Look up by username or email.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Unconditional overwrite: login stores a fresh value, logout clears it.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()>;

    /// Conditional rotate: replace the stored refresh token with `next` only
    /// if it still equals `presented`, as a single atomic update. Returns
    /// false when the stored value differed (rotation already happened or
    /// the token was cleared).
    async fn rotate_refresh_token(&self, id: Uuid, presented: &str, next: &str) -> Result<bool>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    async fn update_account(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User>;

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> Result<User>;

    async fn update_cover_image(&self, id: Uuid, cover_image_url: &str) -> Result<User>;
}

/// PostgreSQL-backed store over the `user_repo` queries.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        PgUserStore { pool }
    }
}

fn map_unique_violation(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Conflict("username or email already registered".to_string());
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: &NewUser) -> Result<User> {
        user_repo::create_user(&self.pool, new_user)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>> {
        Ok(user_repo::find_by_identifier(&self.pool, identifier).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(user_repo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(user_repo::find_by_username(&self.pool, username).await?)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<()> {
        Ok(user_repo::set_refresh_token(&self.pool, id, token).await?)
    }

    async fn rotate_refresh_token(&self, id: Uuid, presented: &str, next: &str) -> Result<bool> {
        Ok(user_repo::rotate_refresh_token(&self.pool, id, presented, next).await?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        Ok(user_repo::update_password(&self.pool, id, password_hash).await?)
    }

    async fn update_account(
        &self,
        id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User> {
        user_repo::update_account(&self.pool, id, full_name, email)
            .await
            .map_err(map_unique_violation)
    }

    async fn update_avatar(&self, id: Uuid, avatar_url: &str) -> Result<User> {
        Ok(user_repo::update_avatar(&self.pool, id, avatar_url).await?)
    }

    async fn update_cover_image(&self, id: Uuid, cover_image_url: &str) -> Result<User> {
        Ok(user_repo::update_cover_image(&self.pool, id, cover_image_url).await?)
    }
}
