//! Per-user progress rows recorded against a track.

use crate::model::projection::{select_fields, Project, Projection, View};
use crate::model::track::Track;
use crate::model::user::UserId;
use crate::model::weak_ref::WeakRef;
use serde::{Deserialize, Serialize};

pub type UserDataId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserData {
    pub id: UserDataId,
    pub user_id: UserId,
    /// Stored verbatim; the track may not exist.
    pub track_id: WeakRef<Track>,
    /// Unix epoch milliseconds.
    pub action_date: i64,
    pub order_major: i64,
    pub order_minor: i64,
    pub is_done: bool,
}

const FIELDS: &[&str] = &[
    "id",
    "track_id",
    "action_date",
    "order_major",
    "order_minor",
    "is_done",
];

impl Project for UserData {
    fn project(&self, _view: View) -> Projection {
        select_fields(self, FIELDS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserDataInput {
    pub track_id: i64,
    /// Defaults to creation time.
    #[serde(default)]
    pub action_date: Option<i64>,
    #[serde(default)]
    pub order_major: i64,
    #[serde(default)]
    pub order_minor: i64,
    #[serde(default)]
    pub is_done: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserDataPatch {
    pub track_id: Option<i64>,
    pub action_date: Option<i64>,
    pub order_major: Option<i64>,
    pub order_minor: Option<i64>,
    pub is_done: Option<bool>,
}

impl UserData {
    pub fn apply(&self, patch: UserDataPatch) -> UserDataInput {
        UserDataInput {
            track_id: patch.track_id.unwrap_or(self.track_id.id()),
            action_date: Some(patch.action_date.unwrap_or(self.action_date)),
            order_major: patch.order_major.unwrap_or(self.order_major),
            order_minor: patch.order_minor.unwrap_or(self.order_minor),
            is_done: patch.is_done.unwrap_or(self.is_done),
        }
    }
}
