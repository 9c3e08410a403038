/// Route tree assembly. Public fixed paths come first, the public profile
/// lookup lives under `/c/{username}` so it cannot shadow them, and every
/// protected route sits behind the auth gate.
use actix_web::web;

use crate::handlers;
use crate::middleware::JwtAuthMiddleware;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/users")
            .route("/register", web::post().to(handlers::register))
            .route("/login", web::post().to(handlers::login))
            .route("/refresh-token", web::post().to(handlers::refresh_token))
            .route("/c/{username}", web::get().to(handlers::get_user_profile))
            .service(
                web::scope("")
                    .wrap(JwtAuthMiddleware)
                    .route("/logout", web::post().to(handlers::logout))
                    .route("/current-user", web::get().to(handlers::current_user))
                    .route(
                        "/change-current-password",
                        web::post().to(handlers::change_password),
                    )
                    .route("/update-account", web::patch().to(handlers::update_account))
                    .route("/avatar", web::patch().to(handlers::update_avatar))
                    .route(
                        "/cover-image",
                        web::patch().to(handlers::update_cover_image),
                    ),
            ),
    )
    .route("/health", web::get().to(handlers::health_check))
    .route("/health/ready", web::get().to(handlers::readiness_check));
}
