//! Profile model: one per user, carrying role and display attributes.

use crate::model::projection::{select_fields, Project, Projection, View};
use crate::model::user::UserId;
use crate::model::validation::{max_len, required, ValidationResult};
use serde::{Deserialize, Serialize};

pub type ProfileId = i64;

/// Role stored on a profile. Not used to gate any operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Leader,
    Admin,
}

impl Role {
    /// Stable small-integer code persisted in `profiles.role`.
    pub fn code(self) -> i64 {
        match self {
            Self::User => 1,
            Self::Leader => 2,
            Self::Admin => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::User),
            2 => Some(Self::Leader),
            3 => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub nickname: String,
    pub role: Role,
    pub subjects: String,
    pub image_url: String,
}

const LIST_FIELDS: &[&str] = &["id", "nickname", "role", "image_url"];
const DETAIL_FIELDS: &[&str] = &["id", "nickname", "role", "image_url", "subjects"];

impl Project for Profile {
    fn project(&self, view: View) -> Projection {
        match view {
            View::List => select_fields(self, LIST_FIELDS),
            View::Detail => select_fields(self, DETAIL_FIELDS),
        }
    }
}

/// Create payload. Any `user` key sent by a client is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileInput {
    pub nickname: String,
    pub role: Role,
    #[serde(default)]
    pub subjects: String,
    #[serde(default)]
    pub image_url: String,
}

impl ProfileInput {
    pub fn new(nickname: impl Into<String>, role: Role) -> Self {
        Self {
            nickname: nickname.into(),
            role,
            subjects: String::new(),
            image_url: String::new(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        required("nickname", &self.nickname)?;
        max_len("subjects", &self.subjects)?;
        max_len("image_url", &self.image_url)
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProfilePatch {
    pub nickname: Option<String>,
    pub role: Option<Role>,
    pub subjects: Option<String>,
    pub image_url: Option<String>,
}

impl Profile {
    /// Merges `patch` over this row, producing a full payload to validate.
    pub fn apply(&self, patch: ProfilePatch) -> ProfileInput {
        ProfileInput {
            nickname: patch.nickname.unwrap_or_else(|| self.nickname.clone()),
            role: patch.role.unwrap_or(self.role),
            subjects: patch.subjects.unwrap_or_else(|| self.subjects.clone()),
            image_url: patch.image_url.unwrap_or_else(|| self.image_url.clone()),
        }
    }
}
