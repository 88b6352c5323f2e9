use crate::{
    auth::{Credentials, LoginRequest, RegisterRequest, TokenResponse},
    error::AppError,
    models::{normalize_email, User},
    store::Database,
};
use actix_web::{post, web, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates a new account and returns an access token for it.
///
/// ## Responses:
/// - `201 Created`: `{access_token, token_type}`.
/// - `409 Conflict`: the email is already registered.
/// - `422 Unprocessable Entity`: name, email or password fail validation.
#[post("/register")]
pub async fn register(
    db: web::Data<Database>,
    credentials: web::Data<Credentials>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest {
        name,
        email,
        password,
    } = register_data.into_inner();
    let email = normalize_email(&email);

    if db.users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "A user with this email already exists.".into(),
        ));
    }

    let hashed_password = credentials.hash(password).await?;
    // The unique index still rejects a concurrent registration of the same email.
    let user = User::new(name, email, hashed_password);
    db.users.create_user(&user).await?;
    log::info!("registered user {}", user.id);

    let token = credentials.issue(&user.id.to_hex())?;
    Ok(HttpResponse::Created().json(TokenResponse::bearer(token)))
}

/// Login user
///
/// Exchanges an email and password for an access token. An unknown email and a
/// wrong password are reported identically.
#[post("/login")]
pub async fn login(
    db: web::Data<Database>,
    credentials: web::Data<Credentials>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let LoginRequest { email, password } = login_data.into_inner();
    let email = normalize_email(&email);

    let invalid = || AppError::Unauthorized("Invalid email or password.".into());

    let user = match db.users.find_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            log::debug!("login attempt for unknown email");
            return Err(invalid());
        }
    };

    if !credentials
        .verify(password, user.hashed_password.clone())
        .await?
    {
        log::warn!("failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = credentials.issue(&user.id.to_hex())?;
    Ok(HttpResponse::Ok().json(TokenResponse::bearer(token)))
}
