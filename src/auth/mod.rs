pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::Deserialize;
use validator::Validate;

use crate::models::Actor;

pub use extractors::CurrentActor;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password, MIN_PASSWORD_COST};
pub use token::{Claims, TokenService};

/// Represents the payload for every login endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Must be a valid email format.
    #[validate(email)]
    pub email: String,
    /// Must be at least 6 characters long.
    #[validate(length(min = 6))]
    pub password: String,
}

/// Outcome of a successful login: the signed-in actor and its bearer token.
///
/// Short-lived; handed once to [`crate::resources::LoginResource`].
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResult {
    pub user: Actor,
    pub token: Option<String>,
}

impl AuthResult {
    pub fn new(user: Actor, token: Option<String>) -> Self {
        Self { user, token }
    }
}
