//! Account and API token persistence.
//!
//! Users own themselves, so this module does not go through the owned
//! repository. Password hashes are read here and handed to the identity
//! service only.

use crate::model::user::{AuthToken, User, UserId};
use crate::repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, email, name, is_active, is_staff, is_superuser, date_joined";

/// Insert payload for one account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: i64,
}

fn user_from_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        is_active: int_to_bool("users", "is_active", row.get(3)?)?,
        is_staff: int_to_bool("users", "is_staff", row.get(4)?)?,
        is_superuser: int_to_bool("users", "is_superuser", row.get(5)?)?,
        date_joined: row.get(6)?,
    })
}

/// Inserts an active user; a taken email yields `UniqueViolation`.
pub fn insert_user(conn: &Connection, record: &UserRecord<'_>) -> RepoResult<UserId> {
    conn.execute(
        "INSERT INTO users (email, name, password_hash, is_active, is_staff, is_superuser, date_joined)
         VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6);",
        params![
            record.email,
            record.name,
            record.password_hash,
            bool_to_int(record.is_staff),
            bool_to_int(record.is_superuser),
            record.date_joined,
        ],
    )
    .map_err(RepoError::on_unique("user"))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_user(conn: &Connection, id: UserId) -> RepoResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1;");
    conn.query_row(&sql, [id], |row| Ok(user_from_row(row)))
        .optional()?
        .transpose()
}

/// User with `email` together with their stored password hash.
pub fn find_user_with_hash(conn: &Connection, email: &str) -> RepoResult<Option<(User, String)>> {
    let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?1;");
    conn.query_row(&sql, [email], |row| {
        let hash: String = row.get(7)?;
        Ok(user_from_row(row).map(|user| (user, hash)))
    })
    .optional()?
    .transpose()
}

pub fn set_user_active(conn: &Connection, id: UserId, active: bool) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE users SET is_active = ?1 WHERE id = ?2;",
        params![bool_to_int(active), id],
    )?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity: "user", id });
    }
    Ok(())
}

/// Returns the token of `user_id`, storing `candidate_key` if the user has
/// none yet. Concurrent callers converge on whichever key was stored first.
pub fn get_or_create_token(
    conn: &Connection,
    user_id: UserId,
    candidate_key: &str,
    created_at: i64,
) -> RepoResult<AuthToken> {
    conn.execute(
        "INSERT INTO auth_tokens (key, user_id, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id) DO NOTHING;",
        params![candidate_key, user_id, created_at],
    )?;
    conn.query_row(
        "SELECT key, user_id, created_at FROM auth_tokens WHERE user_id = ?1;",
        [user_id],
        |row| {
            Ok(AuthToken {
                key: row.get(0)?,
                user_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .map_err(RepoError::from)
}

/// Owner of the token `key`, if any.
pub fn find_user_by_token(conn: &Connection, key: &str) -> RepoResult<Option<User>> {
    let sql = format!(
        "SELECT {} FROM users u JOIN auth_tokens t ON t.user_id = u.id WHERE t.key = ?1;",
        USER_COLUMNS
            .split(", ")
            .map(|column| format!("u.{column}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    conn.query_row(&sql, [key], |row| Ok(user_from_row(row)))
        .optional()?
        .transpose()
}
