mod jwt_auth;

pub use jwt_auth::{
    AuthenticatedUser, JwtAuthMiddleware, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE,
};
