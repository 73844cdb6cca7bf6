//! Use-case services: the operations offered to an access layer.
//!
//! # Responsibility
//! - Resolve identities and run every owned operation on behalf of a
//!   [`Caller`](crate::model::user::Caller).
//! - Validate payloads before any write.
//! - Translate repository errors into the caller-facing [`CoreError`].
//!
//! # Invariants
//! - Rows owned by another user surface as `NotFound`.
//! - Multi-row writes run inside one immediate transaction.

pub mod book_service;
pub mod identity_service;
pub mod profile_service;
pub mod progress_service;
pub mod task_service;
pub mod track_service;

use crate::auth::PasswordError;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug)]
pub enum CoreError {
    /// Credentials do not resolve to an active user.
    Unauthenticated,
    /// Row is absent or owned by someone else.
    NotFound { entity: &'static str, id: i64 },
    /// Payload failed validation; names the field.
    Validation(ValidationError),
    /// Uniqueness rule rejected a create (second profile, taken email).
    Conflict { entity: &'static str },
    /// Image storage failure.
    Media(io::Error),
    /// Password hashing backend failure.
    Password(PasswordError),
    /// Persistence failure.
    Repo(RepoError),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => f.write_str("authentication credentials are invalid"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict { entity } => write!(f, "{entity} already exists"),
            Self::Media(err) => write!(f, "media storage failed: {err}"),
            Self::Password(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Media(err) => Some(err),
            Self::Password(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::UniqueViolation { entity } => Self::Conflict { entity },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(value: rusqlite::Error) -> Self {
        RepoError::from(value).into()
    }
}

impl From<ValidationError> for CoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PasswordError> for CoreError {
    fn from(value: PasswordError) -> Self {
        Self::Password(value)
    }
}

impl From<io::Error> for CoreError {
    fn from(value: io::Error) -> Self {
        Self::Media(value)
    }
}

#[cfg(test)]
mod tests {
    use super::CoreError;
    use crate::repo::RepoError;

    #[test]
    fn repo_errors_map_to_caller_taxonomy() {
        let not_found: CoreError = RepoError::NotFound {
            entity: "track",
            id: 7,
        }
        .into();
        assert!(matches!(
            not_found,
            CoreError::NotFound {
                entity: "track",
                id: 7
            }
        ));

        let conflict: CoreError = RepoError::UniqueViolation { entity: "profile" }.into();
        assert!(matches!(conflict, CoreError::Conflict { entity: "profile" }));

        let other: CoreError = RepoError::InvalidData("bad".to_string()).into();
        assert!(matches!(other, CoreError::Repo(_)));
    }
}
