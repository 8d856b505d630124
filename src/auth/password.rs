//! bcrypt hashing for student and lecturer passwords.

use crate::error::AppError;

/// Cheapest cost bcrypt accepts. Tests hash with it to stay fast.
pub const MIN_PASSWORD_COST: u32 = 4;
pub const MAX_PASSWORD_COST: u32 = 31;

/// Hashes `password` with the configured bcrypt `cost` (4..=31).
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost).map_err(|e| {
        log::error!("password hashing failed at cost {}: {}", cost, e);
        AppError::InternalServerError(format!("Failed to hash password: {}", e))
    })
}

/// Checks `password` against a stored hash.
///
/// A stored value that is not a bcrypt hash counts as a mismatch, so an
/// account with a corrupt hash simply cannot sign in.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    // verify only parses and hashes, so every error means the stored value is bad
    Ok(bcrypt::verify(password, stored_hash).unwrap_or_else(|e| {
        log::warn!("stored password hash is malformed ({}); treating as mismatch", e);
        false
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hashed = hash_password("lecturer-pass", MIN_PASSWORD_COST).unwrap();

        assert!(hashed.starts_with("$2"));
        assert!(verify_password("lecturer-pass", &hashed).unwrap());
        assert!(!verify_password("student-pass", &hashed).unwrap());
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let first = hash_password("secret1", MIN_PASSWORD_COST).unwrap();
        let second = hash_password("secret1", MIN_PASSWORD_COST).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_cost_below_minimum_is_internal_error() {
        assert!(matches!(
            hash_password("password", MIN_PASSWORD_COST - 1),
            Err(AppError::InternalServerError(_))
        ));
    }

    #[test]
    fn test_malformed_stored_hash_never_matches() {
        for stored in ["", "plaintext", "$2y$99$short"] {
            assert!(!verify_password("plaintext", stored).unwrap(), "{:?}", stored);
        }
    }
}
