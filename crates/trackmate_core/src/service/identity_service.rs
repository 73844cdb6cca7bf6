//! Identity & access: registration, tokens and caller resolution.
//!
//! # Invariants
//! - Only this service constructs a [`Caller`].
//! - Inactive users never resolve, whatever the credentials.
//! - Each user holds at most one API token, stable across requests.

use crate::auth::{generate_token_key, hash_password, unusable_password, verify_password};
use crate::model::now_epoch_ms;
use crate::model::user::{normalize_email, AuthToken, Caller, Credentials, NewUser, User, UserId};
use crate::repo::ensure_connection_ready;
use crate::repo::user_repo::{
    find_user, find_user_by_token, find_user_with_hash, get_or_create_token, insert_user,
    set_user_active, UserRecord,
};
use crate::service::{CoreError, CoreResult};
use log::{info, warn};
use rusqlite::Connection;

pub struct IdentityService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> IdentityService<'conn> {
    pub fn new(conn: &'conn Connection) -> CoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Creates an active, non-staff account.
    pub fn register(&self, new_user: &NewUser) -> CoreResult<User> {
        self.create_user(new_user, false)
    }

    /// Creates an active staff superuser. A password is mandatory.
    pub fn create_superuser(&self, email: &str, name: &str, password: &str) -> CoreResult<User> {
        let new_user = NewUser {
            email: email.to_string(),
            name: name.to_string(),
            password: Some(password.to_string()),
        };
        self.create_user(&new_user, true)
    }

    fn create_user(&self, new_user: &NewUser, privileged: bool) -> CoreResult<User> {
        let email = new_user.validate()?;
        let password_hash = match &new_user.password {
            Some(password) => hash_password(password)?,
            None => unusable_password(),
        };
        let user_id = insert_user(
            self.conn,
            &UserRecord {
                email: &email,
                name: new_user.name.trim(),
                password_hash: &password_hash,
                is_staff: privileged,
                is_superuser: privileged,
                date_joined: now_epoch_ms(),
            },
        )?;
        info!(
            "event=user_register module=identity status=ok user_id={user_id} superuser={privileged}"
        );
        self.load(user_id)
    }

    /// Returns the caller's API token, creating it on first use.
    pub fn issue_token(&self, email: &str, password: &str) -> CoreResult<AuthToken> {
        let caller = self.resolve_identity(&Credentials::Password {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let token = get_or_create_token(
            self.conn,
            caller.id(),
            &generate_token_key(),
            now_epoch_ms(),
        )?;
        info!(
            "event=token_issue module=identity status=ok user_id={}",
            caller.id()
        );
        Ok(token)
    }

    /// Resolves `credentials` to an active user or fails with
    /// `Unauthenticated`.
    pub fn resolve_identity(&self, credentials: &Credentials) -> CoreResult<Caller> {
        let (kind, user) = match credentials {
            Credentials::Token(key) => ("token", find_user_by_token(self.conn, key.trim())?),
            Credentials::Password { email, password } => {
                let found = match normalize_email(email) {
                    Some(email) => find_user_with_hash(self.conn, &email)?,
                    None => None,
                };
                let user = found
                    .filter(|(_, hash)| verify_password(password, hash))
                    .map(|(user, _)| user);
                ("password", user)
            }
        };
        match user {
            Some(user) if user.is_active => Ok(Caller::new(user)),
            Some(user) => {
                warn!(
                    "event=auth_resolve module=identity status=error kind={kind} user_id={} error_code=inactive",
                    user.id
                );
                Err(CoreError::Unauthenticated)
            }
            None => {
                warn!(
                    "event=auth_resolve module=identity status=error kind={kind} error_code=invalid_credentials"
                );
                Err(CoreError::Unauthenticated)
            }
        }
    }

    /// Enables or disables an account.
    pub fn set_active(&self, user_id: UserId, active: bool) -> CoreResult<User> {
        set_user_active(self.conn, user_id, active)?;
        info!("event=user_set_active module=identity status=ok user_id={user_id} active={active}");
        self.load(user_id)
    }

    pub fn get_user(&self, user_id: UserId) -> CoreResult<User> {
        self.load(user_id)
    }

    fn load(&self, user_id: UserId) -> CoreResult<User> {
        find_user(self.conn, user_id)?.ok_or(CoreError::NotFound {
            entity: "user",
            id: user_id,
        })
    }
}

