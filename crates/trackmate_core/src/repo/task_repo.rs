//! Task persistence. The `references` field is stored in column `refs`.

use crate::model::task::{Task, TaskInput};
use crate::model::weak_ref::WeakRef;
use crate::repo::filter::{Filter, LinkTable};
use crate::repo::owned::{Columns, OwnedEntity};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;

/// `track_tasks`, seen from the task side.
pub const TASK_TRACKS: LinkTable = crate::repo::track_repo::TRACK_TASKS.reversed();

impl OwnedEntity for Task {
    const ENTITY: &'static str = "task";
    const TABLE: &'static str = "tasks";
    const OWNER_COLUMN: &'static str = "user_id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "track_id",
        "order_major",
        "order_minor",
        "task_name",
        "ranges",
        "learning_time",
        "guideline",
        "refs",
    ];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let track_id: Option<i64> = row.get(2)?;
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            track_id: track_id.map(WeakRef::new),
            order_major: row.get(3)?,
            order_minor: row.get(4)?,
            task_name: row.get(5)?,
            ranges: row.get(6)?,
            learning_time: row.get(7)?,
            guideline: row.get(8)?,
            references: row.get(9)?,
        })
    }
}

/// Every stored column except `id` and the owner; also the natural key.
pub fn task_columns(input: &TaskInput) -> Columns {
    vec![
        ("track_id", input.track_id.map_or(Value::Null, Value::Integer)),
        ("order_major", Value::Text(input.order_major.clone())),
        ("order_minor", Value::Text(input.order_minor.clone())),
        ("task_name", Value::Text(input.task_name.clone())),
        ("ranges", Value::Text(input.ranges.clone())),
        ("learning_time", Value::Text(input.learning_time.clone())),
        ("guideline", Value::Text(input.guideline.clone())),
        ("refs", Value::Text(input.references.clone())),
    ]
}

/// Owner-scoped filter; `assigned_only` keeps tasks attached to some track.
pub fn task_filter(assigned_only: bool) -> Filter {
    let filter = Filter::new();
    if assigned_only {
        filter.linked(TASK_TRACKS)
    } else {
        filter
    }
}
