/// Authentication handlers: register, login, logout, refresh.
use actix_multipart::Multipart;
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpRequest, HttpResponse,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::{AuthenticatedUser, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::models::{LoginRequest, RefreshTokenRequest, RegisterRequest, UserProfile};
use crate::services::TokenPair;
use crate::AppState;

use super::read_upload_form;

/// Login response with the profile and both tokens. The tokens also travel
/// as http-only cookies; the body copy exists for non-browser clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub message: String,
}

/// Both token cookies are http-only, secure and same-site restricted; page
/// scripts must never be able to read them.
fn token_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

fn expired_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::ZERO)
        .finish()
}

fn pair_cookies(state: &AppState, pair: &TokenPair) -> (Cookie<'static>, Cookie<'static>) {
    let keys = state.auth.keys();
    (
        token_cookie(
            ACCESS_TOKEN_COOKIE,
            pair.access_token.clone(),
            keys.access_ttl_secs,
        ),
        token_cookie(
            REFRESH_TOKEN_COOKIE,
            pair.refresh_token.clone(),
            keys.refresh_ttl_secs,
        ),
    )
}

/// Register endpoint handler
///
/// Multipart form: text fields `fullName`, `username`, `email`, `password`;
/// file fields `avatar` (required) and `coverImage` (optional). Images are
/// forwarded to the asset host and only their URLs are stored.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    tag = "Auth",
    responses(
        (status = 201, description = "User registered", body = UserProfile),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email already taken")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_upload_form(payload).await?;

    let request = RegisterRequest {
        full_name: form.field("fullName").trim().to_string(),
        username: form.field("username").trim().to_string(),
        email: form.field("email").trim().to_string(),
        password: form.field("password"),
    };
    request.validate()?;

    let (avatar_name, avatar_bytes) = form
        .file("avatar")
        .ok_or_else(|| AppError::Validation("Avatar file is required".to_string()))?;
    let avatar = state
        .assets
        .upload(avatar_bytes.clone(), avatar_name)
        .await?;

    let cover_image_url = match form.file("coverImage") {
        Some((name, bytes)) => Some(state.assets.upload(bytes.clone(), name).await?.url),
        None => None,
    };

    let profile = state
        .auth
        .register(
            &request.username,
            &request.email,
            &request.full_name,
            &request.password,
            avatar.url,
            cover_image_url,
        )
        .await?;

    Ok(HttpResponse::Created().json(profile))
}

/// Login endpoint handler
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "User logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 404, description = "Unknown username or email")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    payload.validate()?;
    let identifier = payload
        .identifier()
        .ok_or_else(|| AppError::Validation("username or email is required".to_string()))?;

    let outcome = state.auth.login(identifier, &payload.password).await?;
    let (access_cookie, refresh_cookie) = pair_cookies(&state, &outcome.tokens);

    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .json(LoginResponse {
            user: outcome.user,
            access_token: outcome.tokens.access_token,
            refresh_token: outcome.tokens.refresh_token,
        }))
}

/// Logout endpoint handler. Gated: the caller is resolved through the auth
/// middleware first.
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "User logged out", body = LogoutResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    state.auth.logout(user.0.id).await?;

    Ok(HttpResponse::Ok()
        .cookie(expired_cookie(ACCESS_TOKEN_COOKIE))
        .cookie(expired_cookie(REFRESH_TOKEN_COOKIE))
        .json(LogoutResponse {
            message: "Logged out successfully".to_string(),
        }))
}

/// Refresh endpoint handler. The presented token comes from the
/// `refreshToken` cookie or, as a fallback, the request body.
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    tag = "Auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = RefreshTokenResponse),
        (status = 401, description = "Missing, invalid or already used refresh token")
    )
)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: Option<web::Json<RefreshTokenRequest>>,
) -> Result<HttpResponse> {
    let presented = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .or_else(|| body.and_then(|b| b.into_inner().refresh_token));

    let pair = state.auth.refresh(presented.as_deref()).await?;
    let (access_cookie, refresh_cookie) = pair_cookies(&state, &pair);

    Ok(HttpResponse::Ok()
        .cookie(access_cookie)
        .cookie(refresh_cookie)
        .json(RefreshTokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }))
}
