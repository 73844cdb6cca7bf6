//! Users, credentials and the resolved caller identity.

use crate::model::validation::{max_len, ValidationError, ValidationResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub type UserId = i64;

/// Account row. The password hash never leaves the repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Unix epoch milliseconds.
    pub date_joined: i64,
}

/// Registration payload.
#[derive(Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// `None` registers an account that cannot log in with a password.
    #[serde(default)]
    pub password: Option<String>,
}

impl Debug for NewUser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl NewUser {
    /// Validates the payload and returns the normalized email.
    pub fn validate(&self) -> Result<String, ValidationError> {
        let email = normalize_email(&self.email).ok_or(ValidationError::Missing { field: "email" })?;
        validate_email(&email)?;
        max_len("name", &self.name)?;
        if let Some(password) = &self.password {
            if password.is_empty() {
                return Err(ValidationError::Missing { field: "password" });
            }
        }
        Ok(email)
    }
}

/// What a request presents to prove who it is.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Opaque API token previously issued to the user.
    Token(String),
    /// Email and clear-text password.
    Password { email: String, password: String },
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Token(_) => f.write_str("Credentials::Token(<redacted>)"),
            Self::Password { email, .. } => write!(f, "Credentials::Password({email})"),
        }
    }
}

/// Authenticated, active user on whose behalf an operation runs.
///
/// Only the identity service can construct a `Caller`, so holding one proves
/// the credentials were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user: User,
}

impl Caller {
    pub(crate) fn new(user: User) -> Self {
        Self { user }
    }

    pub fn id(&self) -> UserId {
        self.user.id
    }

    pub fn user(&self) -> &User {
        &self.user
    }
}

/// API token bound to exactly one user.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub key: String,
    pub user_id: UserId,
    pub created_at: i64,
}

impl Debug for AuthToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("user_id", &self.user_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Trims the address and lowercases its domain part.
///
/// Returns `None` for blank input. The local part keeps its case.
pub fn normalize_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.rsplit_once('@') {
        Some((local, domain)) => Some(format!("{local}@{}", domain.to_lowercase())),
        None => Some(trimmed.to_string()),
    }
}

fn validate_email(email: &str) -> ValidationResult {
    max_len("email", email)?;
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::Invalid {
            field: "email",
            reason: "enter a valid email address".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, Credentials, NewUser};
    use crate::model::validation::ValidationError;

    #[test]
    fn normalize_email_lowercases_domain_only() {
        assert_eq!(
            normalize_email("  Ana.Lee@Example.COM ").as_deref(),
            Some("Ana.Lee@example.com")
        );
        assert_eq!(normalize_email("   "), None);
    }

    #[test]
    fn new_user_requires_email() {
        let payload = NewUser {
            name: "Ana".to_string(),
            ..NewUser::default()
        };
        assert_eq!(
            payload.validate(),
            Err(ValidationError::Missing { field: "email" })
        );
    }

    #[test]
    fn new_user_rejects_malformed_email() {
        let payload = NewUser {
            email: "not-an-email".to_string(),
            ..NewUser::default()
        };
        assert_eq!(payload.validate().unwrap_err().field(), "email");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials::Password {
            email: "a@b.io".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{creds:?}").contains("hunter22"));

        let token = Credentials::Token("abcdef".to_string());
        assert!(!format!("{token:?}").contains("abcdef"));
    }
}
