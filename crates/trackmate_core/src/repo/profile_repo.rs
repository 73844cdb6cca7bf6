//! Profile persistence. `profiles.user_id` is UNIQUE: one profile per user.

use crate::model::profile::{Profile, ProfileInput, Role};
use crate::model::user::UserId;
use crate::repo::owned::{Columns, OwnedEntity};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row};

impl OwnedEntity for Profile {
    const ENTITY: &'static str = "profile";
    const TABLE: &'static str = "profiles";
    const OWNER_COLUMN: &'static str = "user_id";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "nickname", "role", "subjects", "image_url"];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let code: i64 = row.get(3)?;
        let role = Role::from_code(code).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid role code `{code}` in profiles.role"))
        })?;
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            nickname: row.get(2)?,
            role,
            subjects: row.get(4)?,
            image_url: row.get(5)?,
        })
    }
}

pub fn profile_columns(input: &ProfileInput) -> Columns {
    vec![
        ("nickname", Value::Text(input.nickname.clone())),
        ("role", Value::Integer(input.role.code())),
        ("subjects", Value::Text(input.subjects.clone())),
        ("image_url", Value::Text(input.image_url.clone())),
    ]
}

/// Profile of `user_id`, if the user has created one.
pub fn find_profile_by_user(conn: &Connection, user_id: UserId) -> RepoResult<Option<Profile>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, nickname, role, subjects, image_url
         FROM profiles
         WHERE user_id = ?1;",
    )?;
    let row = stmt
        .query_row([user_id], |row| Ok(Profile::from_row(row)))
        .optional()?;
    row.transpose()
}
