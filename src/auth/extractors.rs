use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::Claims;
use crate::error::AppError;
use crate::models::ActorRef;

/// The verified claims of the caller.
///
/// `AuthMiddleware` inserts the claims into the request extensions for every
/// authenticated-tier route. If they are missing, the route was not guarded
/// and the extractor answers `401 Unauthorized`.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Claims);

impl CurrentActor {
    pub fn actor(&self) -> ActorRef {
        self.0.actor()
    }

    pub fn claims(&self) -> &Claims {
        &self.0
    }
}

impl FromRequest for CurrentActor {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>().cloned() {
            Some(claims) => ready(Ok(CurrentActor(claims))),
            None => {
                let err = AppError::Unauthorized(
                    "Caller claims not found in request. Ensure AuthMiddleware is active.".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActorKind;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_current_actor_extractor_success() {
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(Claims {
            sub: 123,
            role: ActorKind::Lecturer,
            iat: 0,
            exp: usize::MAX,
            jti: "jti".to_string(),
        });

        let mut payload = Payload::None;
        let extracted = CurrentActor::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap().actor(), ActorRef::Lecturer(123));
    }

    #[actix_rt::test]
    async fn test_current_actor_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let extracted = CurrentActor::from_request(&req, &mut payload).await;
        assert!(extracted.is_err());

        let response = extracted.unwrap_err().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
