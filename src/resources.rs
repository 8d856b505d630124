//! Response shapes.
//!
//! Each resource is a pure projection of an internal value; building one never
//! touches state and building it twice from the same input yields equal output.

use serde::Serialize;

use crate::auth::AuthResult;
use crate::models::{Actor, Lecturer, Student};

pub const LOGIN_SUCCESS: &str = "Đăng nhập thành công";
pub const LOGOUT_SUCCESS: &str = "Đăng xuất thành công";
pub const REFRESH_SUCCESS: &str = "Làm mới token thành công";
pub const DELETE_SUCCESS: &str = "Xóa thành công";

/// Public view of a student or lecturer, tagged with `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UserResource {
    Student(Student),
    Lecturer(Lecturer),
}

impl From<&Actor> for UserResource {
    fn from(actor: &Actor) -> Self {
        match actor {
            Actor::Student(s) => UserResource::Student(s.clone()),
            Actor::Lecturer(l) => UserResource::Lecturer(l.clone()),
        }
    }
}

/// Body returned by the login endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoginResource {
    pub user: UserResource,
    pub token: Option<String>,
    pub message: &'static str,
}

impl LoginResource {
    pub fn from_result(result: &AuthResult) -> Self {
        Self {
            user: UserResource::from(&result.user),
            token: result.token.clone(),
            message: LOGIN_SUCCESS,
        }
    }
}

/// Body returned by `POST /refresh`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenResource {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
    pub message: &'static str,
}

impl TokenResource {
    pub fn bearer(token: String, expires_in: i64) -> Self {
        Self {
            token,
            token_type: "bearer",
            expires_in,
            message: REFRESH_SUCCESS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageResource {
    pub message: &'static str,
}

impl MessageResource {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewStudent, Student};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn student() -> Actor {
        Actor::Student(Student::from_new(
            3,
            NewStudent {
                student_code: "SV003".to_string(),
                full_name: "Pham Thi D".to_string(),
                email: "d@example.edu".to_string(),
                phone: None,
                class_name: Some("CNTT1".to_string()),
                password_hash: "hash".to_string(),
            },
        ))
    }

    #[test]
    fn test_login_resource_with_token() {
        let result = AuthResult::new(student(), Some("abc123".to_string()));
        let body = serde_json::to_value(LoginResource::from_result(&result)).unwrap();

        assert_eq!(body["token"], json!("abc123"));
        assert_eq!(body["message"], json!("Đăng nhập thành công"));
        assert_eq!(body["user"]["type"], json!("student"));
        assert_eq!(body["user"]["id"], json!(3));
        assert_eq!(body["user"]["email"], json!("d@example.edu"));
        assert!(body["user"].get("password_hash").is_none());
    }

    #[test]
    fn test_login_resource_without_token_is_null() {
        let result = AuthResult::new(student(), None);
        let body = serde_json::to_value(LoginResource::from_result(&result)).unwrap();
        assert!(body.as_object().unwrap().contains_key("token"));
        assert_eq!(body["token"], serde_json::Value::Null);
    }

    #[test]
    fn test_login_resource_is_idempotent() {
        for token in [Some("t".to_string()), None] {
            let result = AuthResult::new(student(), token);
            let first = LoginResource::from_result(&result);
            let second = LoginResource::from_result(&result);
            assert_eq!(first, second);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
            assert_eq!(first.token.is_none(), result.token.is_none());
        }
    }

    #[test]
    fn test_token_resource_shape() {
        let body = serde_json::to_value(TokenResource::bearer("tok".to_string(), 3600)).unwrap();
        assert_eq!(
            body,
            json!({
                "token": "tok",
                "token_type": "bearer",
                "expires_in": 3600,
                "message": REFRESH_SUCCESS
            })
        );
    }
}
