use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use bson::oid::ObjectId;
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::{AuthenticatedUserId, Credentials};
use crate::error::AppError;

/// Routes under the guarded scope that are reachable without a token.
const PUBLIC_SUFFIXES: [&str; 2] = ["/auth/login", "/auth/register"];

/// Rejects requests without a valid bearer token before they reach a handler.
///
/// On success the caller's id is stored in the request extensions as an
/// [`AuthenticatedUserId`].
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let path = req.path();
        if PUBLIC_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        match authenticate(&req) {
            Ok(user_id) => {
                req.extensions_mut().insert(user_id);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(app_err) => {
                log::debug!("rejected {} {}: {}", req.method(), req.path(), app_err);
                let res = req.into_response(app_err.error_response());
                Box::pin(async move { Ok(res.map_into_right_body()) })
            }
        }
    }
}

fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedUserId, AppError> {
    let credentials = req
        .app_data::<web::Data<Credentials>>()
        .ok_or_else(|| AppError::InternalServerError("Credentials are not configured".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        // Auth schemes are case-insensitive.
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Not authenticated.".into()))?;

    let subject = credentials.decode(token)?;
    // A well-signed token whose subject is not an id was not issued by us.
    ObjectId::parse_str(&subject)
        .map(AuthenticatedUserId)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token.".into()))
}
