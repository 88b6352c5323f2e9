use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{UpdateUserRequest, UserProfile},
    store::Database,
};
use actix_web::{get, put, web, HttpResponse, Responder};
use validator::Validate;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found.".into())
}

/// Returns the caller's own profile.
///
/// ## Responses:
/// - `200 OK`: `UserProfile` as JSON.
/// - `404 Not Found`: the account behind a still-valid token no longer exists.
#[get("/me")]
pub async fn get_profile(
    db: web::Data<Database>,
    user_id: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let user = db
        .users
        .find_user(user_id.0)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}

/// Updates the caller's name and/or email.
///
/// ## Responses:
/// - `200 OK`: the updated `UserProfile`.
/// - `400 Bad Request`: the body has no fields.
/// - `404 Not Found`: the account no longer exists.
/// - `409 Conflict`: another user already has the requested email.
/// - `422 Unprocessable Entity`: a field fails validation.
#[put("/me")]
pub async fn update_profile(
    db: web::Data<Database>,
    user_id: AuthenticatedUserId,
    update: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    update.validate()?;
    let update = update.into_inner().normalized();
    if update.is_empty() {
        return Err(AppError::BadRequest("No fields to update.".into()));
    }

    if let Some(email) = &update.email {
        if let Some(holder) = db.users.find_user_by_email(email).await? {
            if holder.id != user_id.0 {
                return Err(AppError::Conflict(
                    "A user with this email already exists.".into(),
                ));
            }
        }
    }

    let user = db
        .users
        .update_user(user_id.0, &update)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(UserProfile::from(user)))
}
