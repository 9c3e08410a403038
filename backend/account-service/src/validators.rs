use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Input validation utilities for the account service

// Compiled once at first use; the pattern is a compile-time constant in
// practice.
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9_-]{3,32}$").expect("hardcoded username regex is invalid")
});

/// Validate username format (3-32 characters, lowercase alphanumeric with
/// - and _). Usernames are case-normalized before storage, so the pattern
/// is lowercase-only.
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// validator crate compatible wrapper around [`validate_username`].
pub fn validate_username_shape(username: &str) -> Result<(), ValidationError> {
    if validate_username(&username.to_lowercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username"))
    }
}
