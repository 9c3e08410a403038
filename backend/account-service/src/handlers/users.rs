/// Profile handlers: current user, account updates, image updates, public
/// profile lookup.
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::models::{ChangePasswordRequest, PublicProfile, UpdateAccountRequest, UserProfile};
use crate::AppState;

use super::read_upload_form;

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/v1/users/current-user
#[utoipa::path(
    get,
    path = "/api/v1/users/current-user",
    tag = "Users",
    responses(
        (status = 200, description = "Authenticated caller profile", body = UserProfile),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn current_user(user: AuthenticatedUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(user.0))
}

/// POST /api/v1/users/change-current-password
#[utoipa::path(
    post,
    path = "/api/v1/users/change-current-password",
    tag = "Users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Old password incorrect")
    )
)]
pub async fn change_password(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    state
        .auth
        .change_password(user.0.id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// PATCH /api/v1/users/update-account
#[utoipa::path(
    patch,
    path = "/api/v1/users/update-account",
    tag = "Users",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_account(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: web::Json<UpdateAccountRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;

    if payload.full_name.is_none() && payload.email.is_none() {
        return Err(AppError::Validation(
            "fullName or email is required".to_string(),
        ));
    }

    let store = state.auth.store();

    if let Some(email) = payload.email.as_deref() {
        if let Some(existing) = store.find_by_identifier(email).await? {
            if existing.id != user.0.id {
                return Err(AppError::Conflict("Email already registered".to_string()));
            }
        }
    }

    let updated = store
        .update_account(
            user.0.id,
            payload.full_name.as_deref(),
            payload.email.as_deref(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(UserProfile::from(updated)))
}

/// PATCH /api/v1/users/avatar (multipart, single `avatar` file)
#[utoipa::path(
    patch,
    path = "/api/v1/users/avatar",
    tag = "Users",
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Missing avatar file")
    )
)]
pub async fn update_avatar(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_upload_form(payload).await?;
    let (filename, bytes) = form
        .file("avatar")
        .ok_or_else(|| AppError::Validation("Avatar file is required".to_string()))?;

    let asset = state.assets.upload(bytes.clone(), filename).await?;
    let updated = state.auth.store().update_avatar(user.0.id, &asset.url).await?;

    Ok(HttpResponse::Ok().json(UserProfile::from(updated)))
}

/// PATCH /api/v1/users/cover-image (multipart, single `coverImage` file)
#[utoipa::path(
    patch,
    path = "/api/v1/users/cover-image",
    tag = "Users",
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Missing cover image file")
    )
)]
pub async fn update_cover_image(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_upload_form(payload).await?;
    let (filename, bytes) = form
        .file("coverImage")
        .ok_or_else(|| AppError::Validation("Cover image file is required".to_string()))?;

    let asset = state.assets.upload(bytes.clone(), filename).await?;
    let updated = state
        .auth
        .store()
        .update_cover_image(user.0.id, &asset.url)
        .await?;

    Ok(HttpResponse::Ok().json(UserProfile::from(updated)))
}

/// GET /api/v1/users/c/{username} - public profile lookup
#[utoipa::path(
    get,
    path = "/api/v1/users/c/{username}",
    tag = "Users",
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn get_user_profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let username = path.into_inner();

    let user = state
        .auth
        .store()
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

    Ok(HttpResponse::Ok().json(PublicProfile::from(user)))
}
