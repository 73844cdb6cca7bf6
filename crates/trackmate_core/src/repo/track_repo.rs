//! Track persistence: the track row, its link tables and aggregate loading.
//!
//! # Invariants
//! - Link rows are replaced as a set; a track never holds a link twice.
//! - Aggregates embed linked books and tasks ordered by id.

use crate::model::book::Book;
use crate::model::profile::{Profile, ProfileId};
use crate::model::task::Task;
use crate::model::track::{DiscoveryFilter, Track, TrackAggregate, TrackFilter, TrackId, TrackInput};
use crate::repo::filter::{Filter, LinkTable};
use crate::repo::owned::{CatalogRepository, Columns, OwnedEntity};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

pub const TRACK_BOOKS: LinkTable = LinkTable {
    table: "track_books",
    near: "track_id",
    far: "book_id",
};

pub const TRACK_TASKS: LinkTable = LinkTable {
    table: "track_tasks",
    near: "track_id",
    far: "task_id",
};

impl OwnedEntity for Track {
    const ENTITY: &'static str = "track";
    const TABLE: &'static str = "tracks";
    const OWNER_COLUMN: &'static str = "leader_id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "leader_id",
        "profile_id",
        "subject_major",
        "subject_minor",
        "target_test",
        "target_grade",
        "track_name",
        "description",
        "link",
        "followers_num",
        "rating_avg",
        "image",
        "published_date",
    ];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            leader_id: row.get(1)?,
            profile_id: row.get(2)?,
            subject_major: row.get(3)?,
            subject_minor: row.get(4)?,
            target_test: row.get(5)?,
            target_grade: row.get(6)?,
            track_name: row.get(7)?,
            description: row.get(8)?,
            link: row.get(9)?,
            followers_num: row.get(10)?,
            rating_avg: row.get(11)?,
            image: row.get(12)?,
            published_date: row.get(13)?,
        })
    }
}

/// Plain track columns. `published_date` must already be resolved.
pub fn track_columns(input: &TrackInput, published_date: i64) -> Columns {
    vec![
        ("subject_major", Value::Text(input.subject_major.clone())),
        ("subject_minor", Value::Text(input.subject_minor.clone())),
        ("target_test", Value::Text(input.target_test.clone())),
        ("target_grade", Value::Text(input.target_grade.clone())),
        ("track_name", Value::Text(input.track_name.clone())),
        ("description", Value::Text(input.description.clone())),
        ("link", Value::Text(input.link.clone())),
        ("followers_num", Value::Integer(input.followers_num)),
        ("rating_avg", Value::Real(input.rating_avg)),
        ("published_date", Value::Integer(published_date)),
    ]
}

pub fn profile_column(profile_id: Option<ProfileId>) -> (&'static str, Value) {
    ("profile_id", profile_id.map_or(Value::Null, Value::Integer))
}

/// Owner-scoped list filter.
pub fn track_filter(filter: TrackFilter) -> Filter {
    Filter::new()
        .eq_opt("subject_major", filter.subject_major)
        .eq_opt("subject_minor", filter.subject_minor)
        .eq_opt("target_test", filter.target_test)
        .eq_opt("target_grade", filter.target_grade)
        .linked_to_any(TRACK_BOOKS, filter.books)
        .linked_to_any(TRACK_TASKS, filter.tasks)
}

/// Unscoped discovery filter.
pub fn discovery_filter(filter: DiscoveryFilter) -> Filter {
    Filter::new()
        .eq_opt("subject_major", filter.subject_major)
        .eq_opt("subject_minor", filter.subject_minor)
        .eq_opt("target_test", filter.target_test)
        .eq_opt("target_grade", filter.target_grade)
}

/// Replaces every link of `track_id` in `link` with `ids`.
///
/// Duplicate ids collapse into one link row.
pub fn replace_links(
    conn: &Connection,
    link: LinkTable,
    track_id: TrackId,
    ids: &[i64],
) -> RepoResult<()> {
    conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1;", link.table, link.near),
        [track_id],
    )?;
    let mut stmt = conn.prepare(&format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2);",
        link.table, link.near, link.far
    ))?;
    for id in ids {
        stmt.execute([track_id, *id])?;
    }
    Ok(())
}

/// Rows of `E` linked to `track_id` through `link`, ordered by id.
pub fn list_linked<E: OwnedEntity>(
    conn: &Connection,
    link: LinkTable,
    track_id: TrackId,
) -> RepoResult<Vec<E>> {
    let columns = E::COLUMNS
        .iter()
        .map(|column| format!("e.{column}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {columns}
         FROM {table} e
         JOIN {link_table} l ON l.{far} = e.id
         WHERE l.{near} = ?
         ORDER BY e.id ASC;",
        table = E::TABLE,
        link_table = link.table,
        far = link.far,
        near = link.near,
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter([track_id]))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(E::from_row(row)?);
    }
    Ok(out)
}

/// Loads the embedded profile, books and tasks of `track`.
pub fn load_aggregate(conn: &Connection, track: Track) -> RepoResult<TrackAggregate> {
    let profile = match track.profile_id {
        Some(profile_id) => CatalogRepository::<Profile>::new(conn).find(profile_id)?,
        None => None,
    };
    let books = list_linked::<Book>(conn, TRACK_BOOKS, track.id)?;
    let tasks = list_linked::<Task>(conn, TRACK_TASKS, track.id)?;
    Ok(TrackAggregate {
        track,
        profile,
        books,
        tasks,
    })
}
