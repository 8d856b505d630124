#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use chrono::Duration;
use serde_json::{json, Value};

use campusdesk::auth::{hash_password, AuthMiddleware, TokenService, MIN_PASSWORD_COST};
use campusdesk::models::{Lecturer, NewLecturer, NewStudent, Student};
use campusdesk::routes::{self, health, API_PREFIX};
use campusdesk::state::AppState;

pub const PASSWORD: &str = "Password123!";

pub fn state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(
        TokenService::new("integration-test-secret", Duration::minutes(30)),
        MIN_PASSWORD_COST,
    ))
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .service(health::health)
            .service(
                web::scope(API_PREFIX)
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            ),
    )
    .await
}

pub async fn seed_student(state: &AppState, code: &str, email: &str) -> Student {
    state
        .students
        .create(NewStudent {
            student_code: code.to_string(),
            full_name: format!("Student {}", code),
            email: email.to_string(),
            phone: None,
            class_name: Some("CNTT1".to_string()),
            password_hash: hash_password(PASSWORD, state.password_cost).unwrap(),
        })
        .await
        .unwrap()
}

pub async fn seed_lecturer(state: &AppState, code: &str, email: &str) -> Lecturer {
    state
        .lecturers
        .create(NewLecturer {
            lecturer_code: code.to_string(),
            full_name: format!("Lecturer {}", code),
            email: email.to_string(),
            phone: None,
            department: Some("Computer Science".to_string()),
            is_admin: false,
            password_hash: hash_password(PASSWORD, state.password_cost).unwrap(),
        })
        .await
        .unwrap()
}

/// Logs in through `path` and returns the bearer token.
pub async fn login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    path: &str,
    email: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri(&format!("{}{}", API_PREFIX, path))
        .set_json(json!({ "email": email, "password": PASSWORD }))
        .to_request();
    let body: Value = test::call_and_read_body_json(app, req).await;
    body["token"]
        .as_str()
        .unwrap_or_else(|| panic!("login via {} failed: {}", path, body))
        .to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// Sends `req` and returns the status with the parsed JSON body (`Null` when empty).
pub async fn send(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error>,
    req: Request,
) -> (actix_web::http::StatusCode, Value) {
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
        })
    };
    (status, body)
}
