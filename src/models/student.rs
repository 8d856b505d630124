use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::CODE_REGEX;

/// A student account as stored in the `students` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Student {
    pub id: i32,
    pub student_code: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub class_name: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /students`.
#[derive(Debug, Deserialize, Validate)]
pub struct StudentInput {
    #[validate(
        length(min = 1, max = 20),
        regex(path = "CODE_REGEX", message = "Code must be alphanumeric, underscores, or hyphens")
    )]
    pub student_code: String,
    #[validate(length(min = 1, max = 255))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub class_name: Option<String>,
}

/// Payload for `PUT /students/{id}`. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StudentUpdate {
    #[validate(
        length(min = 1, max = 20),
        regex(path = "CODE_REGEX", message = "Code must be alphanumeric, underscores, or hyphens")
    )]
    pub student_code: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(max = 100))]
    pub class_name: Option<String>,
}

/// A validated student ready to be inserted, with its password already hashed.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub student_code: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub class_name: Option<String>,
    pub password_hash: String,
}

/// Column changes for an update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct StudentChanges {
    pub student_code: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub class_name: Option<String>,
    pub password_hash: Option<String>,
}

impl StudentInput {
    pub fn into_new(self, password_hash: String) -> NewStudent {
        NewStudent {
            student_code: self.student_code,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            class_name: self.class_name,
            password_hash,
        }
    }
}

impl StudentUpdate {
    pub fn into_changes(self, password_hash: Option<String>) -> StudentChanges {
        StudentChanges {
            student_code: self.student_code,
            full_name: self.full_name,
            email: self.email,
            phone: self.phone,
            class_name: self.class_name,
            password_hash,
        }
    }
}

impl Student {
    pub fn from_new(id: i32, new: NewStudent) -> Self {
        let now = Utc::now();
        Self {
            id,
            student_code: new.student_code,
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            class_name: new.class_name,
            password_hash: new.password_hash,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: StudentChanges) {
        if let Some(code) = changes.student_code {
            self.student_code = code;
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
        if changes.class_name.is_some() {
            self.class_name = changes.class_name;
        }
        if let Some(hash) = changes.password_hash {
            self.password_hash = hash;
        }
        self.updated_at = Utc::now();
    }
}
