use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::CODE_REGEX;

/// A lecturer account as stored in the `lecturers` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Lecturer {
    pub id: i32,
    pub lecturer_code: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    /// Stored flag, flipped by `PATCH /lecturers/{id}/admin-status`. Not consulted by any access check.
    pub is_admin: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /lecturers`.
#[derive(Debug, Deserialize, Validate)]
pub struct LecturerInput {
    #[validate(
        length(min = 1, max = 20),
        regex(path = "CODE_REGEX", message = "Code must be alphanumeric, underscores, or hyphens")
    )]
    pub lecturer_code: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub department: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Payload for `PUT /lecturers/{id}`. Absent fields are left unchanged.
///
/// Admin status is only changed through `PATCH /lecturers/{id}/admin-status`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LecturerUpdate {
    #[validate(
        length(min = 1, max = 20),
        regex(path = "CODE_REGEX", message = "Code must be alphanumeric, underscores, or hyphens")
    )]
    pub lecturer_code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub department: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewLecturer {
    pub lecturer_code: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub is_admin: bool,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct LecturerChanges {
    pub lecturer_code: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub password_hash: Option<String>,
}

impl LecturerInput {
    pub fn into_new(self, password_hash: String) -> NewLecturer {
        NewLecturer {
            lecturer_code: self.lecturer_code,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            department: self.department,
            is_admin: self.is_admin,
            password_hash,
        }
    }
}

impl LecturerUpdate {
    pub fn into_changes(self, password_hash: Option<String>) -> LecturerChanges {
        LecturerChanges {
            lecturer_code: self.lecturer_code,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            department: self.department,
            password_hash,
        }
    }
}

impl Lecturer {
    pub fn from_new(id: i32, new: NewLecturer) -> Self {
        let now = Utc::now();
        Self {
            id,
            lecturer_code: new.lecturer_code,
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            department: new.department,
            is_admin: new.is_admin,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: LecturerChanges) {
        if let Some(code) = changes.lecturer_code {
            self.lecturer_code = code;
        }
        if let Some(name) = changes.full_name {
            self.full_name = name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if changes.phone.is_some() {
            self.phone = changes.phone;
        }
        if changes.department.is_some() {
            self.department = changes.department;
        }
        if let Some(hash) = changes.password_hash {
            self.password_hash = hash;
        }
        self.updated_at = Utc::now();
    }

    pub fn toggle_admin(&mut self) {
        self.is_admin = !self.is_admin;
        self.updated_at = Utc::now();
    }
}
