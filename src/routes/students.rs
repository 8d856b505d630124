use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::{hash_password, CurrentActor},
    error::AppError,
    models::{StudentInput, StudentUpdate},
    resources::{MessageResource, DELETE_SUCCESS},
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Student not found".into())
}

/// Lists every student, ordered by id.
///
/// ## Responses:
/// - `200 OK`: JSON array of students.
/// - `401 Unauthorized`: missing or invalid token.
pub async fn list_students(
    state: web::Data<AppState>,
    _current: CurrentActor,
) -> Result<impl Responder, AppError> {
    let students = state.students.list().await?;
    Ok(HttpResponse::Ok().json(students))
}

/// Creates a student account.
///
/// ## Responses:
/// - `201 Created`: the new student.
/// - `400 Bad Request`: malformed JSON or email already registered.
/// - `422 Unprocessable Entity`: validation failed.
pub async fn create_student(
    state: web::Data<AppState>,
    current: CurrentActor,
    payload: web::Json<StudentInput>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let input = payload.into_inner();
    let password_hash = hash_password(&input.password, state.password_cost)?;

    let student = state.students.create(input.into_new(password_hash)).await?;
    log::info!("{} created student {}", current.actor(), student.id);
    Ok(HttpResponse::Created().json(student))
}

pub async fn get_student(
    state: web::Data<AppState>,
    _current: CurrentActor,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let student = state
        .students
        .find(id.into_inner())
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(student))
}

/// Updates the fields present in the body; a new password is re-hashed.
pub async fn update_student(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
    payload: web::Json<StudentUpdate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let mut update = payload.into_inner();
    let password_hash = match update.password.take() {
        Some(password) => Some(hash_password(&password, state.password_cost)?),
        None => None,
    };

    let id = id.into_inner();
    let student = state
        .students
        .update(id, update.into_changes(password_hash))
        .await?
        .ok_or_else(not_found)?;
    log::info!("{} updated student {}", current.actor(), id);
    Ok(HttpResponse::Ok().json(student))
}

pub async fn delete_student(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    if !state.students.delete(id).await? {
        return Err(not_found());
    }
    log::info!("{} deleted student {}", current.actor(), id);
    Ok(HttpResponse::Ok().json(MessageResource::new(DELETE_SUCCESS)))
}
