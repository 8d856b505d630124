use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::CurrentActor,
    error::{AppError, Context, TaskError},
    models::{ActorRef, NewTask, Task, TaskInput},
    resources::{MessageResource, DELETE_SUCCESS},
    state::AppState,
};

async fn ensure_receiver_exists(state: &AppState, receiver: ActorRef) -> Result<(), AppError> {
    if state.actor_exists(receiver).await? {
        return Ok(());
    }
    let mut context = Context::new();
    context.insert("receiver_id".into(), json!(receiver.id()));
    context.insert("receiver_type".into(), json!(receiver.kind()));
    Err(TaskError::business_rule_violation("receiver_must_exist", context).into())
}

async fn load(state: &AppState, id: i32) -> Result<Task, AppError> {
    state
        .tasks
        .find(id)
        .await?
        .ok_or_else(|| TaskError::not_found(id).into())
}

/// Loads a task the caller created, or fails with `ACCESS_DENIED` for `action`.
async fn load_owned(state: &AppState, id: i32, caller: ActorRef, action: &str) -> Result<Task, AppError> {
    let task = load(state, id).await?;
    if task.creator != caller {
        log::info!("{} denied '{}' on task {}", caller, action, id);
        return Err(TaskError::access_denied(action, id).into());
    }
    Ok(task)
}

/// Retrieves the tasks the caller created or received, newest first.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing or invalid token.
pub async fn get_tasks(
    state: web::Data<AppState>,
    current: CurrentActor,
) -> Result<impl Responder, AppError> {
    let tasks = state.tasks.list_for(current.actor()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task from the caller to `receiver`.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `422 Unprocessable Entity`: validation failed, or the receiver does not
///   exist (`BUSINESS_RULE_VIOLATION`, rule `receiver_must_exist`).
pub async fn create_task(
    state: web::Data<AppState>,
    current: CurrentActor,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;
    ensure_receiver_exists(&state, task_data.receiver).await?;

    let new = NewTask::from_input(task_data.into_inner(), current.actor());
    let task = state.tasks.create(new).await?;
    log::info!("{} created task {} for {}", task.creator, task.id, task.receiver);
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a task the caller created or received.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `403 Forbidden`: `ACCESS_DENIED` for action `view`.
/// - `404 Not Found`: `TASK_NOT_FOUND`.
pub async fn get_task(
    state: web::Data<AppState>,
    current: CurrentActor,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    let task = load(&state, id).await?;
    if !task.involves(current.actor()) {
        return Err(TaskError::access_denied("view", id).into());
    }
    Ok(HttpResponse::Ok().json(task))
}

/// Replaces a task's title, description and receiver. Creator only.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `403 Forbidden`: `ACCESS_DENIED` for action `update`.
/// - `404 Not Found`: `TASK_NOT_FOUND`.
/// - `422 Unprocessable Entity`: validation failed or the receiver does not exist.
pub async fn update_task(
    state: web::Data<AppState>,
    current: CurrentActor,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    let task = load_owned(&state, id, current.actor(), "update").await?;

    task_data.validate()?;
    if task_data.receiver != task.receiver {
        ensure_receiver_exists(&state, task_data.receiver).await?;
    }

    let updated = state
        .tasks
        .update(id, task_data.into_inner())
        .await?
        .ok_or_else(|| TaskError::not_found(id))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes a task. Creator only.
///
/// ## Responses:
/// - `200 OK`: confirmation message.
/// - `403 Forbidden`: `ACCESS_DENIED` for action `delete`.
/// - `404 Not Found`: `TASK_NOT_FOUND`.
pub async fn delete_task(
    state: web::Data<AppState>,
    current: CurrentActor,
    task_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = task_id.into_inner();
    load_owned(&state, id, current.actor(), "delete").await?;

    if !state.tasks.delete(id).await? {
        return Err(TaskError::not_found(id).into());
    }
    log::info!("{} deleted task {}", current.actor(), id);
    Ok(HttpResponse::Ok().json(MessageResource::new(DELETE_SUCCESS)))
}
