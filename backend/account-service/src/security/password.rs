/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

use crate::error::{AppError, Result};

/// Hash a secret using Argon2id. Returns the PHC hash string suitable for
/// storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(rand::thread_rng());
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AppError::Internal("Failed to hash password".to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a candidate secret against a stored hash.
///
/// Failure is a plain `false` so callers own the error surface; a malformed
/// stored hash also verifies as `false` rather than erroring. The comparison
/// never touches plaintext on the stored side.
pub fn verify_password(candidate: &str, stored_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(_) => {
            tracing::warn!("stored credential hash is not a valid PHC string");
            return false;
        }
    };

    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed_hash)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct horse battery staple";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash));
    }

    #[test]
    fn test_wrong_password_fails() {
        let hash = hash_password("correct").unwrap();
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_hash_itself_is_not_a_valid_secret() {
        // Hash and secret space must not collide: presenting the stored
        // hash string as the candidate must fail.
        let hash = hash_password("correct").unwrap();
        assert!(!verify_password(&hash, &hash));
    }

    #[test]
    fn test_malformed_stored_hash_is_false_not_panic() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same secret").unwrap();
        let b = hash_password("same secret").unwrap();
        assert_ne!(a, b);
    }
}
