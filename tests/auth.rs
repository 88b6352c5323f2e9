mod common;

use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::{json, Value};
use taskvault::auth::TokenResponse;
use taskvault::models::UserProfile;

use common::{bearer, init_app, register_user, sign_token, JWT_SECRET};

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let app = init_app().await;

    let register_payload = json!({
        "name": "Integration User",
        "email": "integration@example.com",
        "password": "Password123!"
    });
    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body_bytes = test::read_body(resp).await;
    assert_eq!(
        status,
        StatusCode::CREATED,
        "Registration failed. Body: {:?}",
        String::from_utf8_lossy(&body_bytes)
    );
    let registered: TokenResponse =
        serde_json::from_slice(&body_bytes).expect("Failed to parse register response JSON");
    assert_eq!(registered.token_type, "bearer");

    // Same email again is a conflict
    let req_conflict = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(&register_payload)
        .to_request();
    let resp_conflict = test::call_service(&app, req_conflict).await;
    assert_eq!(resp_conflict.status(), StatusCode::CONFLICT);
    let conflict_body: Value = test::read_body_json(resp_conflict).await;
    assert_eq!(conflict_body["error"], "A user with this email already exists.");

    // Profile behind the registration token
    let req_me = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(bearer(&registered.access_token))
        .to_request();
    let resp_me = test::call_service(&app, req_me).await;
    assert_eq!(resp_me.status(), StatusCode::OK);
    let registered_profile: UserProfile = test::read_body_json(resp_me).await;

    // Login, then the login token resolves to the same user
    let req_login = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(&json!({
            "email": "integration@example.com",
            "password": "Password123!"
        }))
        .to_request();
    let resp_login = test::call_service(&app, req_login).await;
    assert_eq!(resp_login.status(), StatusCode::OK);
    let login_response: TokenResponse = test::read_body_json(resp_login).await;
    assert!(!login_response.access_token.is_empty());

    let req_me = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(bearer(&login_response.access_token))
        .to_request();
    let resp_me = test::call_service(&app, req_me).await;
    assert_eq!(resp_me.status(), StatusCode::OK);
    let profile: UserProfile = test::read_body_json(resp_me).await;

    assert_eq!(profile.id, registered_profile.id);
    assert_eq!(profile.name, "Integration User");
    assert_eq!(profile.email, "integration@example.com");
}

#[actix_rt::test]
async fn test_invalid_registration_inputs() {
    let app = init_app().await;

    let test_cases = vec![
        // Deserialization errors (400 for missing fields)
        (
            json!({ "email": "test@example.com", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing name",
        ),
        (
            json!({ "name": "Test User", "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing email",
        ),
        (
            json!({ "name": "Test User", "email": "test@example.com" }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        // Validation errors (422 for invalid formats/lengths)
        (
            json!({ "name": "Test User", "email": "invalid-email", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "name": "T", "email": "test@example.com", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "name too short",
        ),
        (
            json!({ "name": "a".repeat(101), "email": "test@example.com", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "name too long",
        ),
        (
            json!({ "name": "Test User", "email": "test@example.com", "password": "1234567" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password too short",
        ),
        (
            json!({ "name": "Test User", "email": "test@example.com", "password": "p".repeat(129) }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "password too long",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;

        assert_eq!(
            status, expected_status,
            "Test case failed: {}. Expected {}, got {}. Body: {}",
            description, expected_status, status, body
        );
        assert!(body["error"].is_string(), "{}: error body missing", description);
    }
}

#[actix_rt::test]
async fn test_invalid_login_inputs() {
    let app = init_app().await;

    let valid_user_email = "login_test_user@example.com";
    let valid_user_password = "Password123!";
    register_user(&app, "Login Tester", valid_user_email, valid_user_password).await;

    let test_cases = vec![
        (
            json!({ "password": "Password123!" }),
            StatusCode::BAD_REQUEST,
            "missing email",
        ),
        (
            json!({ "email": valid_user_email }),
            StatusCode::BAD_REQUEST,
            "missing password",
        ),
        (
            json!({ "email": "invalid-email", "password": "Password123!" }),
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid email format",
        ),
        (
            json!({ "email": valid_user_email, "password": "WrongPassword123!" }),
            StatusCode::UNAUTHORIZED,
            "incorrect password",
        ),
        (
            json!({ "email": "nonexistent@example.com", "password": "Password123!" }),
            StatusCode::UNAUTHORIZED,
            "non-existent user",
        ),
    ];

    for (payload, expected_status, description) in test_cases {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(&payload)
            .to_request();

        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body_bytes = test::read_body(resp).await;

        assert_eq!(
            status,
            expected_status,
            "Test case failed: {}. Expected {}, got {}. Body: {:?}",
            description,
            expected_status,
            status,
            String::from_utf8_lossy(&body_bytes)
        );
    }
}

#[actix_rt::test]
async fn test_bad_credentials_do_not_reveal_which_part_was_wrong() {
    let app = init_app().await;
    register_user(&app, "Quiet User", "quiet@example.com", "Password123!").await;

    let mut messages = Vec::new();
    for payload in [
        json!({ "email": "quiet@example.com", "password": "nope-nope-nope" }),
        json!({ "email": "nobody@example.com", "password": "Password123!" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        let body: Value = test::read_body_json(resp).await;
        messages.push(body["error"].clone());
    }
    assert_eq!(messages[0], messages[1]);
}

#[actix_rt::test]
async fn test_bad_tokens_are_rejected_on_every_protected_route() {
    let app = init_app().await;
    let token = register_user(&app, "Token Owner", "tokens@example.com", "Password123!").await;

    // Learn our own id to build otherwise-valid tokens around it.
    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let profile: UserProfile = test::call_and_read_body_json(&app, req).await;

    let now = chrono::Utc::now().timestamp();
    let expired = sign_token(JWT_SECRET, &profile.id, now - 7200, now - 3600);
    let wrong_secret = sign_token("not-the-secret", &profile.id, now, now + 3600);
    let not_an_id = sign_token(JWT_SECRET, "admin", now, now + 3600);
    let mut tampered = token.clone();
    tampered.pop();
    tampered.push(if token.ends_with('A') { 'B' } else { 'A' });

    let task_path = format!("/api/v1/tasks/{}", bson::oid::ObjectId::new().to_hex());
    let routes: Vec<(&str, String)> = vec![
        ("GET", "/api/v1/users/me".to_string()),
        ("PUT", "/api/v1/users/me".to_string()),
        ("GET", "/api/v1/tasks".to_string()),
        ("POST", "/api/v1/tasks".to_string()),
        ("GET", task_path.clone()),
        ("PUT", task_path.clone()),
        ("DELETE", task_path),
    ];

    let bad_headers: Vec<(&str, Option<String>)> = vec![
        ("missing header", None),
        ("expired", Some(format!("Bearer {}", expired))),
        ("wrong secret", Some(format!("Bearer {}", wrong_secret))),
        ("subject not an id", Some(format!("Bearer {}", not_an_id))),
        ("tampered signature", Some(format!("Bearer {}", tampered))),
        ("wrong scheme", Some(format!("Basic {}", token))),
        ("empty bearer", Some("Bearer ".to_string())),
    ];

    for (method, path) in &routes {
        for (label, header_value) in &bad_headers {
            let mut req = match *method {
                "GET" => test::TestRequest::get(),
                "PUT" => test::TestRequest::put(),
                "POST" => test::TestRequest::post(),
                _ => test::TestRequest::delete(),
            }
            .uri(path)
            .set_json(json!({ "title": "x" }));
            if let Some(value) = header_value {
                req = req.insert_header((header::AUTHORIZATION, value.clone()));
            }

            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(
                resp.status(),
                StatusCode::UNAUTHORIZED,
                "{} {} with {} should be rejected",
                method,
                path,
                label
            );
        }
    }
}

#[actix_rt::test]
async fn test_email_domain_case_does_not_create_a_second_account() {
    let app = init_app().await;
    register_user(&app, "Case User", "case@example.com", "Password123!").await;

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/register")
        .set_json(json!({
            "name": "Case User Again",
            "email": "case@EXAMPLE.COM",
            "password": "Password123!"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "email": "case@Example.com", "password": "Password123!" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let token: TokenResponse = test::read_body_json(resp).await;

    let req = test::TestRequest::get()
        .uri("/api/v1/users/me")
        .insert_header(bearer(&token.access_token))
        .to_request();
    let profile: UserProfile = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile.email, "case@example.com");
}

#[actix_rt::test]
async fn test_bearer_scheme_is_case_insensitive() {
    let app = init_app().await;
    let token = register_user(&app, "Scheme User", "scheme@example.com", "Password123!").await;

    for scheme in ["Bearer", "bearer", "BEARER", "bEaReR"] {
        let req = test::TestRequest::get()
            .uri("/api/v1/users/me")
            .insert_header((header::AUTHORIZATION, format!("{} {}", scheme, token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(
            resp.status(),
            StatusCode::OK,
            "scheme {:?} should be accepted",
            scheme
        );
    }
}
