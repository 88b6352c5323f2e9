#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Logger;
use actix_web::{test, web, App};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use taskvault::auth::password::MIN_HASH_COST;
use taskvault::auth::{AuthMiddleware, Claims, Credentials, TokenKeys, TokenResponse};
use taskvault::routes::{self, health};
use taskvault::store::Database;

pub const JWT_SECRET: &str = "integration-test-secret";

pub fn credentials() -> Credentials {
    Credentials::new(
        TokenKeys::new(JWT_SECRET, Algorithm::HS256, 30),
        MIN_HASH_COST,
    )
}

/// The full application, wired like `main.rs` but on the in-memory store.
pub async fn init_app(
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(Database::in_memory()))
            .app_data(web::Data::new(credentials()))
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api/v1")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

/// Signs arbitrary claims, bypassing the app's own token issuing.
pub fn sign_token(secret: &str, sub: &str, iat: i64, exp: i64) -> String {
    encode(
        &Header::default(),
        &Claims {
            sub: sub.to_string(),
            iat,
            exp,
        },
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// Registers a user and returns their access token.
pub async fn register_user<S, B>(app: &S, name: &str, email: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(
        resp.status(),
        actix_web::http::StatusCode::CREATED,
        "registration of {} failed",
        email
    );
    let body: TokenResponse = test::read_body_json(resp).await;
    body.access_token
}

pub async fn create_task<S, B>(app: &S, token: &str, payload: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/tasks")
        .insert_header(bearer(token))
        .set_json(payload)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
    test::read_body_json(resp).await
}
