#![doc = "The `campusdesk` library crate."]
#![doc = ""]
#![doc = "Authentication for students and lecturers, their records, and the tasks and"]
#![doc = "calendar events between them, served as a JSON API. `main.rs` wires these"]
#![doc = "pieces into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod factories;
pub mod models;
pub mod repository;
pub mod resources;
pub mod routes;
pub mod state;

pub use crate::error::{AppError, ErrorCode, TaskError};
pub use crate::state::AppState;
