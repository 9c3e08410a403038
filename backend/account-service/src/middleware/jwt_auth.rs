/// Auth gate middleware: resolves the presented access token to a live
/// account before any protected handler runs, and exposes the result through
/// the [`AuthenticatedUser`] extractor.
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::UserProfile;
use crate::AppState;

/// Cookie names of the token pair. These are the transport contract: both
/// cookies are set http-only and secure, so page scripts never see them.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Resolved caller identity, inserted into request extensions by the gate.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserProfile);

/// Pull the bearer value out of the request: the access-token cookie wins,
/// the `Authorization: Bearer` header is the fallback.
fn extract_access_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Auth gate middleware factory
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            // Read token and app state before touching extensions_mut so no
            // immutable borrows are live across the mutable access.
            let token = extract_access_token(&req);

            let auth = req
                .app_data::<actix_web::web::Data<AppState>>()
                .map(|state| state.auth.clone())
                .ok_or_else(|| {
                    actix_web::error::ErrorInternalServerError("application state missing")
                })?;

            let profile = auth.authenticate(token.as_deref()).await?;

            req.extensions_mut().insert(AuthenticatedUser(profile));

            let res = service.call(req).await?;
            Ok(res)
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "Caller identity missing in request extensions",
            ))),
        }
    }
}
