/// Service-level error taxonomy
///
/// Every service operation fails with exactly one [`ServiceError`] kind. The
/// HTTP layer maps kinds to status codes; services never decide status codes.
///
/// | Kind | Meaning |
/// |------|---------|
/// | `Validation` | Input rejected before touching the store |
/// | `Auth` | Bad credentials |
/// | `NotFound` | Entity or referenced entity missing |
/// | `Conflict` | Uniqueness violated |
/// | `Dependency` | Postal lookup or store unavailable |
/// | `State` | Lifecycle transition not allowed from current state |
/// | `Hashing` / `Signing` | Crypto primitive failed |

use crate::auth::{jwt::JwtError, password::PasswordError};
use crate::postal::PostalError;
use crate::repository::RepositoryError;

/// Credential failures raised by services
///
/// Bearer token failures never reach a service; the request authenticator
/// rejects them with [`crate::auth::middleware::AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// Error returned by every service operation
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(AuthFailure),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Upstream collaborator failed; the message is for logs only
    #[error("{0}")]
    Dependency(String),

    #[error("{0}")]
    State(String),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] PasswordError),

    #[error("token signing failed: {0}")]
    Signing(#[from] JwtError),
}

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<PostalError> for ServiceError {
    fn from(err: PostalError) -> Self {
        ServiceError::Dependency(format!("postal lookup failed: {}", err))
    }
}

impl From<RepositoryError> for ServiceError {
    /// Generic mapping; call sites that know which entity was missing map
    /// `NotFound` themselves for a better message.
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound("record not found".to_string()),
            RepositoryError::Conflict(constraint) => {
                ServiceError::Conflict(format!("unique constraint violated: {}", constraint))
            }
            RepositoryError::ForeignKey(constraint) => {
                ServiceError::NotFound(format!("referenced record not found: {}", constraint))
            }
            RepositoryError::Database(e) => ServiceError::Dependency(format!("database error: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_error_is_dependency() {
        let err = ServiceError::from(PostalError::Status(500));
        assert!(matches!(err, ServiceError::Dependency(_)));
    }

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("accounts_email_key".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::ForeignKey("accounts_role_id_fkey".into())),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut)),
            ServiceError::Dependency(_)
        ));
    }

    #[test]
    fn test_credentials_message_is_generic() {
        let err = ServiceError::Auth(AuthFailure::InvalidCredentials);
        assert_eq!(err.to_string(), "invalid email or password");
    }
}
