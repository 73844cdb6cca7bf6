//! Task model: one ordered step of a study track.

use crate::model::projection::{select_fields, Project, Projection, View};
use crate::model::track::Track;
use crate::model::user::UserId;
use crate::model::validation::{max_len, required, ValidationResult};
use crate::model::weak_ref::WeakRef;
use serde::{Deserialize, Serialize};

pub type TaskId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    /// Track this step was written for; not enforced by the store.
    pub track_id: Option<WeakRef<Track>>,
    pub order_major: String,
    pub order_minor: String,
    pub task_name: String,
    pub ranges: String,
    pub learning_time: String,
    pub guideline: String,
    pub references: String,
}

const LIST_FIELDS: &[&str] = &[
    "id",
    "track_id",
    "order_major",
    "order_minor",
    "task_name",
    "ranges",
    "learning_time",
    "guideline",
];
const DETAIL_FIELDS: &[&str] = &[
    "id",
    "track_id",
    "order_major",
    "order_minor",
    "task_name",
    "ranges",
    "learning_time",
    "guideline",
    "references",
];

impl Project for Task {
    fn project(&self, view: View) -> Projection {
        match view {
            View::List => select_fields(self, LIST_FIELDS),
            View::Detail => select_fields(self, DETAIL_FIELDS),
        }
    }
}

/// Create payload, also used as the get-or-create key for nested tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub track_id: Option<i64>,
    #[serde(default)]
    pub order_major: String,
    #[serde(default)]
    pub order_minor: String,
    #[serde(default)]
    pub task_name: String,
    #[serde(default)]
    pub ranges: String,
    #[serde(default)]
    pub learning_time: String,
    #[serde(default)]
    pub guideline: String,
    #[serde(default)]
    pub references: String,
}

impl TaskInput {
    pub fn validate(&self) -> ValidationResult {
        max_len("order_major", &self.order_major)?;
        max_len("order_minor", &self.order_minor)?;
        required("task_name", &self.task_name)?;
        max_len("ranges", &self.ranges)?;
        max_len("learning_time", &self.learning_time)?;
        max_len("guideline", &self.guideline)?;
        max_len("references", &self.references)
    }
}

/// Partial update. `track_id: Some(None)` clears the loose reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskPatch {
    #[serde(default, with = "double_option")]
    pub track_id: Option<Option<i64>>,
    pub order_major: Option<String>,
    pub order_minor: Option<String>,
    pub task_name: Option<String>,
    pub ranges: Option<String>,
    pub learning_time: Option<String>,
    pub guideline: Option<String>,
    pub references: Option<String>,
}

impl Task {
    pub fn apply(&self, patch: TaskPatch) -> TaskInput {
        TaskInput {
            track_id: patch
                .track_id
                .unwrap_or_else(|| self.track_id.map(|weak| weak.id())),
            order_major: patch.order_major.unwrap_or_else(|| self.order_major.clone()),
            order_minor: patch.order_minor.unwrap_or_else(|| self.order_minor.clone()),
            task_name: patch.task_name.unwrap_or_else(|| self.task_name.clone()),
            ranges: patch.ranges.unwrap_or_else(|| self.ranges.clone()),
            learning_time: patch
                .learning_time
                .unwrap_or_else(|| self.learning_time.clone()),
            guideline: patch.guideline.unwrap_or_else(|| self.guideline.clone()),
            references: patch.references.unwrap_or_else(|| self.references.clone()),
        }
    }
}

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
