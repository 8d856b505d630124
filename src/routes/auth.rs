use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::{
    auth::{verify_password, AuthResult, CurrentActor, LoginRequest},
    error::AppError,
    models::{Actor, ActorKind},
    resources::{LoginResource, MessageResource, TokenResource, UserResource, LOGOUT_SUCCESS},
    state::AppState,
};

/// Finds the account for `credentials` among the given kinds, in order,
/// and checks its password.
async fn attempt(
    state: &AppState,
    credentials: &LoginRequest,
    kinds: &[ActorKind],
) -> Result<Option<Actor>, AppError> {
    for kind in kinds {
        let actor = match kind {
            ActorKind::Student => state
                .students
                .find_by_email(&credentials.email)
                .await?
                .map(Actor::Student),
            ActorKind::Lecturer => state
                .lecturers
                .find_by_email(&credentials.email)
                .await?
                .map(Actor::Lecturer),
        };
        if let Some(actor) = actor {
            if verify_password(&credentials.password, actor.password_hash())? {
                return Ok(Some(actor));
            }
        }
    }
    Ok(None)
}

async fn login_as(
    state: web::Data<AppState>,
    credentials: web::Json<LoginRequest>,
    kinds: &[ActorKind],
) -> Result<HttpResponse, AppError> {
    credentials.validate()?;

    match attempt(&state, &credentials, kinds).await? {
        Some(actor) => {
            let token = state.tokens.issue(actor.reference())?;
            log::info!("{} signed in", actor.reference());
            let result = AuthResult::new(actor, Some(token));
            Ok(HttpResponse::Ok().json(LoginResource::from_result(&result)))
        }
        None => {
            log::info!("failed sign-in for {}", credentials.email);
            Err(AppError::Unauthorized("Invalid credentials".into()))
        }
    }
}

/// Login as whoever owns the email, trying students first.
pub async fn login(
    state: web::Data<AppState>,
    credentials: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_as(state, credentials, &[ActorKind::Student, ActorKind::Lecturer]).await
}

pub async fn login_student(
    state: web::Data<AppState>,
    credentials: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_as(state, credentials, &[ActorKind::Student]).await
}

pub async fn login_lecturer(
    state: web::Data<AppState>,
    credentials: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_as(state, credentials, &[ActorKind::Lecturer]).await
}

/// Revokes the caller's token.
pub async fn logout(
    state: web::Data<AppState>,
    current: CurrentActor,
) -> Result<impl Responder, AppError> {
    state.tokens.revoke(current.claims())?;
    log::info!("{} signed out", current.actor());
    Ok(HttpResponse::Ok().json(MessageResource::new(LOGOUT_SUCCESS)))
}

/// Swaps the caller's token for a fresh one.
pub async fn refresh(
    state: web::Data<AppState>,
    current: CurrentActor,
) -> Result<impl Responder, AppError> {
    let token = state.tokens.refresh(current.claims())?;
    Ok(HttpResponse::Ok().json(TokenResource::bearer(token, state.tokens.ttl_seconds())))
}

/// The caller's own record.
pub async fn me(
    state: web::Data<AppState>,
    current: CurrentActor,
) -> Result<impl Responder, AppError> {
    let actor = state
        .find_actor(current.actor())
        .await?
        .ok_or_else(|| AppError::NotFound("Account no longer exists".into()))?;
    Ok(HttpResponse::Ok().json(UserResource::from(&actor)))
}
