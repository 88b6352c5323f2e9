use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use bson::oid::ObjectId;
use std::future::{ready, Ready};

use crate::error::AppError;

/// The id of the caller, as proven by their bearer token.
///
/// `AuthMiddleware` inserts this into the request extensions after verifying the
/// token; handlers take it as an argument to scope every store query to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUserId(pub ObjectId);

impl FromRequest for AuthenticatedUserId {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUserId>().copied() {
            Some(user_id) => ready(Ok(user_id)),
            // Only reachable when a handler is mounted outside `AuthMiddleware`.
            None => ready(Err(AppError::Unauthorized("Not authenticated.".into()).into())),
        }
    }
}
