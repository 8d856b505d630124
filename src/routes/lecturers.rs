use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::{hash_password, CurrentActor},
    error::AppError,
    models::{LecturerInput, LecturerUpdate},
    resources::{MessageResource, DELETE_SUCCESS},
    state::AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Lecturer not found".into())
}

pub async fn list_lecturers(
    state: web::Data<AppState>,
    _current: CurrentActor,
) -> Result<impl Responder, AppError> {
    let lecturers = state.lecturers.list().await?;
    Ok(HttpResponse::Ok().json(lecturers))
}

pub async fn create_lecturer(
    state: web::Data<AppState>,
    current: CurrentActor,
    payload: web::Json<LecturerInput>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let input = payload.into_inner();
    let password_hash = hash_password(&input.password, state.password_cost)?;

    let lecturer = state.lecturers.create(input.into_new(password_hash)).await?;
    log::info!("{} created lecturer {}", current.actor(), lecturer.id);
    Ok(HttpResponse::Created().json(lecturer))
}

pub async fn get_lecturer(
    state: web::Data<AppState>,
    _current: CurrentActor,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let lecturer = state
        .lecturers
        .find(id.into_inner())
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(lecturer))
}

pub async fn update_lecturer(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
    payload: web::Json<LecturerUpdate>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let mut update = payload.into_inner();
    let password_hash = match update.password.take() {
        Some(password) => Some(hash_password(&password, state.password_cost)?),
        None => None,
    };

    let id = id.into_inner();
    let lecturer = state
        .lecturers
        .update(id, update.into_changes(password_hash))
        .await?
        .ok_or_else(not_found)?;
    log::info!("{} updated lecturer {}", current.actor(), id);
    Ok(HttpResponse::Ok().json(lecturer))
}

pub async fn delete_lecturer(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    if !state.lecturers.delete(id).await? {
        return Err(not_found());
    }
    log::info!("{} deleted lecturer {}", current.actor(), id);
    Ok(HttpResponse::Ok().json(MessageResource::new(DELETE_SUCCESS)))
}

/// Flips the lecturer's admin flag and returns the updated record.
///
/// ## Responses:
/// - `200 OK`: the lecturer with its new `is_admin` value.
/// - `401 Unauthorized`: missing or invalid token.
/// - `404 Not Found`: no lecturer with that id.
pub async fn toggle_admin_status(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    let lecturer = state
        .lecturers
        .toggle_admin(id)
        .await?
        .ok_or_else(not_found)?;
    log::info!(
        "{} set admin status of lecturer {} to {}",
        current.actor(),
        id,
        lecturer.is_admin
    );
    Ok(HttpResponse::Ok().json(lecturer))
}
