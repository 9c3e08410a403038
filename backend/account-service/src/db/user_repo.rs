/// User repository - all database operations for account rows
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, full_name, avatar_url, cover_image_url, password_hash, refresh_token, created_at, updated_at";

/// Create a new account. Username and email are stored lowercased.
pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (id, username, email, full_name, avatar_url, cover_image_url, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(new_user.username.to_lowercase())
    .bind(new_user.email.to_lowercase())
    .bind(&new_user.full_name)
    .bind(&new_user.avatar_url)
    .bind(&new_user.cover_image_url)
    .bind(&new_user.password_hash)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Find an account by username or email (one identifier, either column).
pub async fn find_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE username = $1 OR email = $1
        "#
    ))
    .bind(identifier.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Find an account by ID
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE id = $1
        "#
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Find an account by username
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users
        WHERE username = $1
        "#
    ))
    .bind(username.to_lowercase())
    .fetch_optional(pool)
    .await
}

/// Overwrite the stored refresh token unconditionally (login sets a value,
/// logout clears it with NULL).
pub async fn set_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    token: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users SET refresh_token = $1, updated_at = $2 WHERE id = $3
        "#,
    )
    .bind(token)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Rotate the stored refresh token in one conditional update: the write only
/// happens if the stored value still equals the presented one. Returns false
/// when zero rows matched, i.e. the presented token was already superseded.
///
/// This is the reuse-detection invariant; it must stay a single statement so
/// concurrent rotations for the same account cannot both succeed.
pub async fn rotate_refresh_token(
    pool: &PgPool,
    user_id: Uuid,
    presented: &str,
    next: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users SET refresh_token = $1, updated_at = $2
        WHERE id = $3 AND refresh_token = $4
        "#,
    )
    .bind(next)
    .bind(Utc::now())
    .bind(user_id)
    .bind(presented)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Update an account's password hash
pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    new_password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users SET password_hash = $1, updated_at = $2 WHERE id = $3
        "#,
    )
    .bind(new_password_hash)
    .bind(Utc::now())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update full name and/or email, leaving absent fields untouched.
pub async fn update_account(
    pool: &PgPool,
    user_id: Uuid,
    full_name: Option<&str>,
    email: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET full_name = COALESCE($1, full_name),
            email = COALESCE($2, email),
            updated_at = $3
        WHERE id = $4
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(full_name)
    .bind(email.map(|e| e.to_lowercase()))
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn update_avatar(
    pool: &PgPool,
    user_id: Uuid,
    avatar_url: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET avatar_url = $1, updated_at = $2 WHERE id = $3
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(avatar_url)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn update_cover_image(
    pool: &PgPool,
    user_id: Uuid,
    cover_image_url: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET cover_image_url = $1, updated_at = $2 WHERE id = $3
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(cover_image_url)
    .bind(Utc::now())
    .bind(user_id)
    .fetch_one(pool)
    .await
}
