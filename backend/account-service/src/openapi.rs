use utoipa::OpenApi;

use crate::handlers::auth::{LoginResponse, LogoutResponse, RefreshTokenResponse};
use crate::handlers::users::MessageResponse;
use crate::models::{
    ChangePasswordRequest, LoginRequest, PublicProfile, RefreshTokenRequest, RegisterRequest,
    UpdateAccountRequest, UserProfile,
};

/// OpenAPI document covering the REST endpoints of the account service
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::refresh_token,
        crate::handlers::users::current_user,
        crate::handlers::users::change_password,
        crate::handlers::users::update_account,
        crate::handlers::users::update_avatar,
        crate::handlers::users::update_cover_image,
        crate::handlers::users::get_user_profile
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        RefreshTokenRequest,
        ChangePasswordRequest,
        UpdateAccountRequest,
        UserProfile,
        PublicProfile,
        LoginResponse,
        RefreshTokenResponse,
        LogoutResponse,
        MessageResponse
    )),
    tags(
        (name = "Auth", description = "Authentication & token APIs"),
        (name = "Users", description = "Account profile APIs")
    )
)]
pub struct ApiDoc;
