use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::error::AppError;
use crate::routes::{self, Verb, API_PREFIX};
use crate::state::AppState;

/// The single guard in front of the API scope.
///
/// Each request is looked up in [`routes::ROUTES`]; authenticated-tier entries
/// need an `Authorization: Bearer <token>` header carrying a valid, unrevoked
/// token whose student or lecturer still exists. On success the decoded
/// [`Claims`](crate::auth::Claims) are stored in the request extensions for
/// [`CurrentActor`](crate::auth::CurrentActor). Public entries and paths
/// missing from the table pass straight through.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

/// Looks the request up by the percent-decoded path the router matches on,
/// relative to the scope the guard wraps.
fn requires_auth(req: &ServiceRequest) -> bool {
    let Some(verb) = Verb::from_method(req.method()) else {
        return false;
    };
    let path = req.match_info().unprocessed();
    let relative = path.strip_prefix(API_PREFIX).unwrap_or(path);
    routes::lookup(verb, relative).is_some_and(|entry| entry.requires_auth())
}

async fn authenticate(req: &ServiceRequest) -> Result<(), AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| AppError::InternalServerError("Application state missing".into()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;

    let claims = state.tokens.verify(token)?;
    if !state.actor_exists(claims.actor()).await? {
        return Err(AppError::Unauthorized("Account no longer exists".into()));
    }
    req.extensions_mut().insert(claims);
    Ok(())
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            if requires_auth(&req) {
                if let Err(err) = authenticate(&req).await {
                    log::info!("rejected {} {}: {}", req.method(), req.path(), err);
                    return Ok(req.into_response(err.error_response()).map_into_right_body());
                }
            }
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentActor;
    use crate::auth::hash_password;
    use crate::models::{ActorRef, NewLecturer};
    use actix_web::{http::StatusCode, test, App, HttpResponse};

    async fn seed_lecturer(state: &AppState) -> ActorRef {
        let lecturer = state
            .lecturers
            .create(NewLecturer {
                lecturer_code: "GV004".into(),
                full_name: "Pham Thi Dao".into(),
                email: "dao@example.edu".into(),
                phone: None,
                department: None,
                is_admin: false,
                password_hash: hash_password("secret1", state.password_cost).unwrap(),
            })
            .await
            .unwrap();
        ActorRef::Lecturer(lecturer.id)
    }

    async fn whoami(actor: CurrentActor) -> HttpResponse {
        HttpResponse::Ok().body(actor.actor().to_string())
    }

    async fn open() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_rt::test]
    async fn test_admin_status_without_token_is_rejected_before_handler() {
        let state = web::Data::new(AppState::for_tests());
        let app = test::init_service(
            App::new().app_data(state).service(
                web::scope(API_PREFIX)
                    .wrap(AuthMiddleware)
                    .route(
                        "/lecturers/{id}/admin-status",
                        web::patch().to(|| async { HttpResponse::ImATeapot().finish() }),
                    ),
            ),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri("/api/lecturers/7/admin-status")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::patch()
            .uri("/api/lecturers/7/admin-status")
            .insert_header(("Authorization", "Bearer garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_percent_encoded_path_is_still_guarded() {
        let state = web::Data::new(AppState::for_tests());
        let app = test::init_service(
            App::new().app_data(state).service(
                web::scope(API_PREFIX)
                    .wrap(AuthMiddleware)
                    .route(
                        "/lecturers/{id}/admin-status",
                        web::patch().to(|| async { HttpResponse::ImATeapot().finish() }),
                    ),
            ),
        )
        .await;

        for uri in [
            "/api/lecturers/7/admin%2Dstatus",
            "/api/%6Cecturers/7/admin-status",
            "/api/lecturers/%37/admin%2dstatus",
        ] {
            let req = test::TestRequest::patch().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[actix_rt::test]
    async fn test_token_of_deleted_account_is_rejected() {
        let state = web::Data::new(AppState::for_tests());
        let actor = seed_lecturer(&state).await;
        let token = state.tokens.issue(actor).unwrap();
        assert!(state.lecturers.delete(actor.id()).await.unwrap());

        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::scope(API_PREFIX).wrap(AuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Account no longer exists");
    }

    #[actix_rt::test]
    async fn test_valid_token_reaches_handler_with_claims() {
        let state = web::Data::new(AppState::for_tests());
        let actor = seed_lecturer(&state).await;
        let token = state.tokens.issue(actor).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::scope(API_PREFIX).wrap(AuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, actor.to_string());
    }

    #[actix_rt::test]
    async fn test_public_routes_skip_the_check() {
        let state = web::Data::new(AppState::for_tests());
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::scope(API_PREFIX).wrap(AuthMiddleware).route("/login", web::post().to(open))),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/login").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_rt::test]
    async fn test_revoked_token_is_rejected() {
        let state = web::Data::new(AppState::for_tests());
        let token = state.tokens.issue(ActorRef::Student(1)).unwrap();
        let claims = state.tokens.verify(&token).unwrap();
        state.tokens.revoke(&claims).unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::scope(API_PREFIX).wrap(AuthMiddleware).route("/me", web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/me")
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
