//!
//! # Custom Error Handling
//!
//! This module defines the two error types used throughout the application.
//!
//! `AppError` is the boundary type returned by every handler. It covers
//! authentication failures, malformed requests, missing records, validation
//! failures, and infrastructure errors, and converts itself into a JSON
//! response of the form `{"error": "..."}`.
//!
//! `TaskError` is the classified domain error raised by the task and calendar
//! handlers. It carries a message, an HTTP status code, a machine-readable
//! [`ErrorCode`], and a context object, and is rendered verbatim as
//! `{message, statusCode, errorCode, context}`.
//!
//! `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `jsonwebtoken::errors::Error`, `bcrypt::BcryptError` and `TaskError` allow
//! handlers to propagate failures with the `?` operator.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use validator::ValidationErrors;

/// Diagnostic key/value pairs attached to a [`TaskError`].
pub type Context = Map<String, Value>;

/// Machine-readable classification of a [`TaskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The referenced task does not exist.
    TaskNotFound,
    /// The caller may not perform the action on the task.
    AccessDenied,
    /// A domain rule rejected the operation.
    BusinessRuleViolation,
    /// Unclassified task failure.
    TaskError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::TaskNotFound => "TASK_NOT_FOUND",
            ErrorCode::AccessDenied => "ACCESS_DENIED",
            ErrorCode::BusinessRuleViolation => "BUSINESS_RULE_VIOLATION",
            ErrorCode::TaskError => "TASK_ERROR",
        }
    }
}

/// A classified task failure.
///
/// Built at the point where the failure is detected and never mutated
/// afterwards. The serialized form is also the HTTP response body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskError {
    message: String,
    status_code: u16,
    error_code: ErrorCode,
    context: Context,
}

impl TaskError {
    /// Generic task failure with status `0` and an empty context.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: 0,
            error_code: ErrorCode::TaskError,
            context: Context::new(),
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// The task with `task_id` does not exist (404).
    pub fn not_found(task_id: i32) -> Self {
        let mut context = Context::new();
        context.insert("task_id".into(), json!(task_id));
        Self {
            message: format!("Task with ID {} not found", task_id),
            status_code: 404,
            error_code: ErrorCode::TaskNotFound,
            context,
        }
    }

    /// The caller may not perform `action` on the task (403).
    pub fn access_denied(action: &str, task_id: i32) -> Self {
        let mut context = Context::new();
        context.insert("action".into(), json!(action));
        context.insert("task_id".into(), json!(task_id));
        Self {
            message: format!("Access denied for action '{}' on task {}", action, task_id),
            status_code: 403,
            error_code: ErrorCode::AccessDenied,
            context,
        }
    }

    /// A domain rule named `rule` rejected the operation (422).
    ///
    /// The resulting context is `extra` plus a `rule` entry; `rule` replaces
    /// any value `extra` already held under that key.
    pub fn business_rule_violation(rule: &str, extra: Context) -> Self {
        let mut context = extra;
        context.insert("rule".into(), json!(rule));
        Self {
            message: format!("Business rule violation: {}", rule),
            status_code: 422,
            error_code: ErrorCode::BusinessRuleViolation,
            context,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The transport status. Codes outside the HTTP range become 500.
    pub fn http_status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.error_code.as_str(), self.message)
    }
}

impl std::error::Error for TaskError {}

impl ResponseError for TaskError {
    fn status_code(&self) -> StatusCode {
        self.http_status()
    }

    fn error_response(&self) -> HttpResponse {
        log::debug!("rendering task error: {}", self);
        HttpResponse::build(self.http_status()).json(self)
    }
}

/// Represents all possible errors that can occur within the application.
///
/// Each variant corresponds to a specific type of error, often carrying a message
/// detailing the issue. These errors are then converted into appropriate HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Authentication failed or is required but missing (HTTP 401).
    Unauthorized(String),
    /// The caller is authenticated but may not touch the resource (HTTP 403).
    Forbidden(String),
    /// Malformed or invalid request (HTTP 400).
    BadRequest(String),
    /// The requested resource was not found (HTTP 404).
    NotFound(String),
    /// Unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Error originating from database operations (HTTP 500).
    DatabaseError(String),
    /// Input validation failed (HTTP 422).
    ValidationError(String),
    /// Classified task failure, rendered with its own status and body.
    Task(TaskError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::Task(err) => write!(f, "Task Error: {}", err),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Task(err) => err.http_status(),
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Task(err) => err.error_response(),
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg)
            | AppError::DatabaseError(msg)
            | AppError::ValidationError(msg) => {
                HttpResponse::build(self.status_code()).json(json!({ "error": msg }))
            }
        }
    }
}

impl From<TaskError> for AppError {
    fn from(error: TaskError) -> AppError {
        AppError::Task(error)
    }
}

/// `RowNotFound` maps to `NotFound`; every other database failure becomes
/// `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        AppError::Unauthorized(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Invalid token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::Forbidden("Not yours".into());
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::BadRequest("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::NotFound("Resource not found".into());
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::InternalServerError("Server error".into());
        assert_eq!(error.error_response().status(), 500);

        let error = AppError::ValidationError("too short".into());
        assert_eq!(error.error_response().status(), 422);
    }

    #[test]
    fn test_task_not_found_shape() {
        let err = TaskError::not_found(42);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), ErrorCode::TaskNotFound);
        assert_eq!(err.context().get("task_id"), Some(&json!(42)));

        let body = serde_json::to_value(&err).unwrap();
        assert_eq!(
            body,
            json!({
                "message": "Task with ID 42 not found",
                "statusCode": 404,
                "errorCode": "TASK_NOT_FOUND",
                "context": { "task_id": 42 }
            })
        );
    }

    #[test]
    fn test_task_not_found_keeps_id_for_any_input() {
        for id in [i32::MIN, -1, 0, 1, 7, 12345, i32::MAX] {
            let err = TaskError::not_found(id);
            assert_eq!(err.context()["task_id"], json!(id));
            assert_eq!(err.error_code(), ErrorCode::TaskNotFound);
            assert_eq!(err.status_code(), 404);
        }
    }

    #[test]
    fn test_access_denied_message_names_action_and_task() {
        for (action, id) in [("update", 3), ("delete", 99), ("view", -4), ("assign to", 0)] {
            let err = TaskError::access_denied(action, id);
            assert!(err.message().contains(action));
            assert!(err.message().contains(&id.to_string()));
            assert_eq!(err.status_code(), 403);
            assert_eq!(err.error_code(), ErrorCode::AccessDenied);
            assert_eq!(err.context()["action"], json!(action));
            assert_eq!(err.context()["task_id"], json!(id));
        }
        assert_eq!(
            TaskError::access_denied("update", 5).message(),
            "Access denied for action 'update' on task 5"
        );
    }

    #[test]
    fn test_business_rule_context_is_superset() {
        let mut extra = Context::new();
        extra.insert("start_time".into(), json!("2024-01-02T00:00:00Z"));
        extra.insert("attempts".into(), json!(3));

        let err = TaskError::business_rule_violation("end_time_before_start_time", extra.clone());
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), ErrorCode::BusinessRuleViolation);
        assert_eq!(
            err.message(),
            "Business rule violation: end_time_before_start_time"
        );
        for (key, value) in &extra {
            assert_eq!(err.context().get(key), Some(value));
        }
        assert_eq!(
            err.context()["rule"],
            json!("end_time_before_start_time")
        );
        assert_eq!(err.context().len(), extra.len() + 1);
    }

    #[test]
    fn test_business_rule_overrides_colliding_rule_key() {
        let mut extra = Context::new();
        extra.insert("rule".into(), json!("stale"));
        let err = TaskError::business_rule_violation("fresh", extra);
        assert_eq!(err.context()["rule"], json!("fresh"));
    }

    #[test]
    fn test_generic_task_error_defaults() {
        let err = TaskError::new("something broke");
        assert_eq!(err.status_code(), 0);
        assert_eq!(err.error_code(), ErrorCode::TaskError);
        assert!(err.context().is_empty());
        // 0 is not an HTTP status
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = TaskError::new("conflict").with_status(409);
        assert_eq!(err.http_status(), StatusCode::CONFLICT);
    }

    #[actix_rt::test]
    async fn test_task_error_renders_through_app_error() {
        let app_error: AppError = TaskError::access_denied("delete", 8).into();
        let response = app_error.error_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["errorCode"], "ACCESS_DENIED");
        assert_eq!(body["statusCode"], 403);
        assert_eq!(body["context"]["action"], "delete");
    }

    #[actix_rt::test]
    async fn test_plain_errors_render_error_field() {
        let response = AppError::NotFound("Student not found".into()).error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Student not found" }));
    }
}
