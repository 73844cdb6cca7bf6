//! Progress row persistence. `track_id` is a plain integer with no foreign key.

use crate::model::user_data::{UserData, UserDataInput};
use crate::model::weak_ref::WeakRef;
use crate::repo::owned::{Columns, OwnedEntity};
use crate::repo::{bool_to_int, int_to_bool, RepoResult};
use rusqlite::types::Value;
use rusqlite::Row;

impl OwnedEntity for UserData {
    const ENTITY: &'static str = "user_data";
    const TABLE: &'static str = "user_data";
    const OWNER_COLUMN: &'static str = "user_id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "track_id",
        "action_date",
        "order_major",
        "order_minor",
        "is_done",
    ];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let track_id: i64 = row.get(2)?;
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            track_id: WeakRef::new(track_id),
            action_date: row.get(3)?,
            order_major: row.get(4)?,
            order_minor: row.get(5)?,
            is_done: int_to_bool("user_data", "is_done", row.get(6)?)?,
        })
    }
}

/// Columns for `input`, with `action_date` already resolved.
pub fn user_data_columns(input: &UserDataInput, action_date: i64) -> Columns {
    vec![
        ("track_id", Value::Integer(input.track_id)),
        ("action_date", Value::Integer(action_date)),
        ("order_major", Value::Integer(input.order_major)),
        ("order_minor", Value::Integer(input.order_minor)),
        ("is_done", Value::Integer(bool_to_int(input.is_done))),
    ]
}
