/// HTTP middleware utilities for forum-service
///
/// Provides JWT authentication for protected routes and the ownership checks
/// handlers run before mutating a resource.
pub mod permissions;

pub use permissions::*;

use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// =====================================================================
// JWT Authentication
// =====================================================================

/// Extracted user identifier stored in request extensions after auth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Actix middleware that validates a Bearer token against the configured keys.
///
/// The token's user must still exist. Keys and store are read from the
/// `web::Data<AppState>` registered on the app.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwtAuthMiddleware {
    allow_query_token: bool,
}

impl JwtAuthMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also accept `?token=` for links that cannot carry headers (downloads)
    pub fn with_query_token() -> Self {
        Self {
            allow_query_token: true,
        }
    }
}

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
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            allow_query_token: self.allow_query_token,
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    allow_query_token: bool,
}

/// Pull the raw token from the Authorization header, or the query string if allowed
///
/// A header that does not carry a bearer token falls through to `?token=`
/// when the query token is allowed.
fn extract_token(req: &ServiceRequest, allow_query_token: bool) -> Result<String, AppError> {
    let header_token = match req.headers().get("Authorization") {
        None => Err(AppError::Unauthorized("No token provided".into())),
        Some(header) => header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))
            .and_then(|value| {
                value
                    .strip_prefix("Bearer ")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))
            }),
    };

    if header_token.is_ok() || !allow_query_token {
        return header_token;
    }

    web::Query::<std::collections::HashMap<String, String>>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.get("token").cloned())
        .filter(|t| !t.is_empty())
        .map_or(header_token, Ok)
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
        let allow_query_token = self.allow_query_token;

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("application state not configured".into()))?;

            let token = extract_token(&req, allow_query_token)?;

            let user_id = state
                .jwt
                .user_id_from_token(&token)
                .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

            if state.store.find_user(user_id).await?.is_none() {
                return Err(AppError::Unauthorized("User no longer exists".into()).into());
            }

            req.extensions_mut().insert(UserId(user_id));

            service.call(req).await
        })
    }
}

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| AppError::Unauthorized("User ID missing".into()).into()),
        )
    }
}
