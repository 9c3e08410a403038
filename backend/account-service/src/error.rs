use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Closed error taxonomy for the service. Every kernel operation returns one
/// of these as a value; none of them abort the process at request time.
#[derive(Debug, Error)]
pub enum AppError {
    /// No token was presented at all (neither cookie nor header/body).
    #[error("Unauthorized request")]
    Unauthenticated,

    /// Bad signature, malformed token, wrong kind, or expired.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token verified but its subject no longer exists in the store.
    #[error("Token subject no longer exists")]
    UnknownSubject,

    /// Presented refresh token no longer matches the stored value.
    #[error("Refresh token is expired or already used")]
    TokenReused,

    /// Login secret did not match the stored credential.
    #[error("Invalid user credentials")]
    CredentialMismatch,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Misconfigured secret material. Fatal at startup validation, never
    /// produced at request time.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::UnknownSubject => StatusCode::UNAUTHORIZED,
            AppError::TokenReused => StatusCode::UNAUTHORIZED,
            AppError::CredentialMismatch => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_type = match self {
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::InvalidToken(_) => "INVALID_TOKEN",
            AppError::UnknownSubject => "UNKNOWN_SUBJECT",
            AppError::TokenReused => "TOKEN_REUSED",
            AppError::CredentialMismatch => "CREDENTIAL_MISMATCH",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        };

        // Database details stay server-side; clients get the stable kind and
        // a human-readable message only.
        let message = match self {
            AppError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        HttpResponse::build(status_code).json(error_response)
    }
}

// Convert validator errors to AppError
impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            // Expiry is its own reportable reason, distinct from a bad
            // signature or a malformed token.
            ErrorKind::ExpiredSignature => {
                AppError::InvalidToken("token has expired".to_string())
            }
            ErrorKind::InvalidSignature => {
                AppError::InvalidToken("signature mismatch".to_string())
            }
            _ => AppError::InvalidToken(err.to_string()),
        }
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::Validation(format!("Malformed multipart payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_401() {
        for err in [
            AppError::Unauthenticated,
            AppError::InvalidToken("x".into()),
            AppError::UnknownSubject,
            AppError::TokenReused,
            AppError::CredentialMismatch,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_expired_jwt_error_is_reported_as_expired() {
        let err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        match AppError::from(err) {
            AppError::InvalidToken(msg) => assert!(msg.contains("expired")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
