use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{ActorKind, ActorRef};

/// Represents the claims encoded within a JWT (JSON Web Token).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Identifier of the student or lecturer the token was issued to.
    pub sub: i32,
    /// Which table `sub` refers to.
    pub role: ActorKind,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: usize,
    /// Expiration timestamp (seconds since epoch).
    pub exp: usize,
    /// Unique token id, used for revocation.
    pub jti: String,
}

impl Claims {
    pub fn actor(&self) -> ActorRef {
        ActorRef::new(self.role, self.sub)
    }
}

/// Issues, verifies, refreshes, and revokes HS256 bearer tokens.
///
/// Cloning is cheap and clones share the revocation list.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    // jti -> exp
    revoked: Arc<Mutex<HashMap<String, usize>>>,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            revoked: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Lifetime of issued tokens, in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    /// Generates a JWT for `actor`, valid for the configured TTL.
    ///
    /// # Returns
    /// Returns `AppError::InternalServerError` if the expiry overflows or encoding fails.
    pub fn issue(&self, actor: ActorRef) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::InternalServerError("Token expiry out of range".into()))?;

        let claims = Claims {
            sub: actor.id(),
            role: actor.kind(),
            iat: now.timestamp() as usize,
            exp: expiration.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };
        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    /// Verifies a JWT string and decodes its claims.
    ///
    /// # Returns
    /// Returns `AppError::Unauthorized` if the token is malformed, its signature is
    /// invalid, it has expired, or it has been revoked.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let claims = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {:?}", e.kind())))?;

        if self.is_revoked(&claims.jti)? {
            return Err(AppError::Unauthorized("Token has been revoked".into()));
        }
        Ok(claims)
    }

    /// Invalidates the token identified by `claims` until it would have expired anyway.
    pub fn revoke(&self, claims: &Claims) -> Result<(), AppError> {
        let now = Utc::now().timestamp() as usize;
        let mut revoked = self.lock_revoked()?;
        revoked.retain(|_, exp| *exp > now);
        revoked.insert(claims.jti.clone(), claims.exp);
        log::debug!("revoked token {} for {}", claims.jti, claims.actor());
        Ok(())
    }

    /// Revokes the current token and issues a fresh one for the same actor.
    pub fn refresh(&self, claims: &Claims) -> Result<String, AppError> {
        let token = self.issue(claims.actor())?;
        self.revoke(claims)?;
        Ok(token)
    }

    fn is_revoked(&self, jti: &str) -> Result<bool, AppError> {
        Ok(self.lock_revoked()?.contains_key(jti))
    }

    fn lock_revoked(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, usize>>, AppError> {
        self.revoked
            .lock()
            .map_err(|_| AppError::InternalServerError("Revocation list poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::minutes(60))
    }

    #[test]
    fn test_token_generation_and_verification() {
        let tokens = service("test_secret_for_gen_verify");
        let token = tokens.issue(ActorRef::Student(1)).unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.role, ActorKind::Student);
        assert_eq!(claims.actor(), ActorRef::Student(1));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_expiration() {
        let tokens = service("test_secret_for_expiration");
        let expiration = Utc::now()
            .checked_sub_signed(Duration::hours(2))
            .expect("valid timestamp")
            .timestamp() as usize;

        let claims_expired = Claims {
            sub: 2,
            role: ActorKind::Lecturer,
            iat: expiration - 3600,
            exp: expiration,
            jti: Uuid::new_v4().to_string(),
        };
        let expired_token = tokens.encode_claims(&claims_expired).unwrap();

        match tokens.verify(&expired_token) {
            Err(AppError::Unauthorized(msg)) => {
                assert!(msg.contains("ExpiredSignature"), "unexpected message: {}", msg);
            }
            Ok(_) => panic!("Token should have been invalid due to expiration"),
            Err(e) => panic!("Unexpected error type for expired token: {:?}", e),
        }
    }

    #[test]
    fn test_invalid_token_signature() {
        let signer = service("some_other_secret");
        let token = signer.issue(ActorRef::Lecturer(3)).unwrap();

        let verifier = service("a_completely_different_secret");
        match verifier.verify(&token) {
            Err(AppError::Unauthorized(msg)) => {
                assert!(msg.contains("InvalidSignature"), "unexpected message: {}", msg);
            }
            Ok(_) => panic!("Token should have been invalid due to signature mismatch"),
            Err(e) => panic!("Unexpected error type for invalid signature: {:?}", e),
        }
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let tokens = service("secret");
        assert!(matches!(
            tokens.verify("not.a.jwt"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_revoked_token_is_rejected() {
        let tokens = service("revocation_secret");
        let token = tokens.issue(ActorRef::Student(5)).unwrap();
        let claims = tokens.verify(&token).unwrap();

        tokens.revoke(&claims).unwrap();
        match tokens.verify(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token has been revoked"),
            other => panic!("expected revocation, got {:?}", other.map(|c| c.jti)),
        }
    }

    #[test]
    fn test_revocation_is_shared_between_clones() {
        let tokens = service("shared_secret");
        let clone = tokens.clone();
        let token = tokens.issue(ActorRef::Lecturer(1)).unwrap();
        let claims = clone.verify(&token).unwrap();
        clone.revoke(&claims).unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_refresh_issues_new_token_and_revokes_old() {
        let tokens = service("refresh_secret");
        let old = tokens.issue(ActorRef::Lecturer(7)).unwrap();
        let claims = tokens.verify(&old).unwrap();

        let new = tokens.refresh(&claims).unwrap();
        assert_ne!(old, new);
        assert!(tokens.verify(&old).is_err());

        let refreshed = tokens.verify(&new).unwrap();
        assert_eq!(refreshed.actor(), ActorRef::Lecturer(7));
        assert_ne!(refreshed.jti, claims.jti);
    }
}
