use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use validator::Validate;

use crate::{
    auth::CurrentActor,
    error::{AppError, Context, TaskError},
    models::{ActorRef, CalendarEvent, CalendarInput, NewCalendarEvent},
    resources::{MessageResource, DELETE_SUCCESS},
    state::AppState,
};

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Calendar event {} not found", id))
}

/// Validation, schedule order, and participant existence, in that order.
async fn check_input(state: &AppState, input: &CalendarInput) -> Result<(), AppError> {
    input.validate()?;
    input.check_schedule()?;
    if !state.actor_exists(input.participant).await? {
        let mut context = Context::new();
        context.insert("participant_id".into(), json!(input.participant.id()));
        context.insert("participant_type".into(), json!(input.participant.kind()));
        return Err(TaskError::business_rule_violation("participant_must_exist", context).into());
    }
    Ok(())
}

async fn load_owned(state: &AppState, id: i32, caller: ActorRef) -> Result<CalendarEvent, AppError> {
    let event = state.calendars.find(id).await?.ok_or_else(|| not_found(id))?;
    if event.creator != caller {
        return Err(AppError::Forbidden(format!(
            "Only the creator may modify calendar event {}",
            id
        )));
    }
    Ok(event)
}

/// Events the caller created or takes part in, by start time.
pub async fn get_events(
    state: web::Data<AppState>,
    current: CurrentActor,
) -> Result<impl Responder, AppError> {
    let events = state.calendars.list_for(current.actor()).await?;
    Ok(HttpResponse::Ok().json(events))
}

pub async fn create_event(
    state: web::Data<AppState>,
    current: CurrentActor,
    payload: web::Json<CalendarInput>,
) -> Result<impl Responder, AppError> {
    check_input(&state, &payload).await?;

    let new = NewCalendarEvent::from_input(payload.into_inner(), current.actor());
    let event = state.calendars.create(new).await?;
    log::info!("{} scheduled calendar event {}", event.creator, event.id);
    Ok(HttpResponse::Created().json(event))
}

pub async fn get_event(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    let event = state.calendars.find(id).await?.ok_or_else(|| not_found(id))?;
    if !event.involves(current.actor()) {
        return Err(AppError::Forbidden(format!(
            "Calendar event {} belongs to someone else",
            id
        )));
    }
    Ok(HttpResponse::Ok().json(event))
}

pub async fn update_event(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
    payload: web::Json<CalendarInput>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    load_owned(&state, id, current.actor()).await?;
    check_input(&state, &payload).await?;

    let event = state
        .calendars
        .update(id, payload.into_inner())
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(HttpResponse::Ok().json(event))
}

pub async fn delete_event(
    state: web::Data<AppState>,
    current: CurrentActor,
    id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let id = id.into_inner();
    load_owned(&state, id, current.actor()).await?;

    if !state.calendars.delete(id).await? {
        return Err(not_found(id));
    }
    log::info!("{} deleted calendar event {}", current.actor(), id);
    Ok(HttpResponse::Ok().json(MessageResource::new(DELETE_SUCCESS)))
}
