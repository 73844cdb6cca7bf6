//! Repository layer: SQL details behind entity-typed data access.
//!
//! # Responsibility
//! - Provide owner-scoped access for every owned entity through one generic
//!   repository, so no entity can skip the ownership filter.
//! - Provide an explicitly named unscoped repository for catalog reads.
//! - Own link-table maintenance and get-or-create semantics.
//!
//! # Invariants
//! - Repository constructors reject connections that are not fully migrated.
//! - Rows owned by someone else are reported as `NotFound`, never as a
//!   distinct "forbidden" outcome.

pub mod book_repo;
pub mod filter;
pub mod owned;
pub mod profile_repo;
pub mod task_repo;
pub mod track_repo;
pub mod user_data_repo;
pub mod user_repo;

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Row is absent or not visible to the caller.
    NotFound { entity: &'static str, id: i64 },
    /// A UNIQUE constraint rejected the write.
    UniqueViolation { entity: &'static str },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::UniqueViolation { entity } => write!(f, "{entity} already exists"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl RepoError {
    /// Maps a UNIQUE failure on `entity` to `UniqueViolation`, passing any
    /// other error through.
    pub(crate) fn on_unique(entity: &'static str) -> impl FnOnce(rusqlite::Error) -> RepoError {
        move |err| {
            let db = DbError::Sqlite(err);
            if db.is_unique_violation() {
                RepoError::UniqueViolation { entity }
            } else {
                RepoError::Db(db)
            }
        }
    }
}

/// Tables every repository expects after migrations.
const REQUIRED_TABLES: &[&str] = &[
    "users",
    "auth_tokens",
    "profiles",
    "books",
    "tasks",
    "tracks",
    "track_books",
    "track_tasks",
    "user_data",
];

/// Checks schema version and required tables before a repository is used.
pub fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected = latest_version();
    let actual = current_version(conn)?;
    if actual != expected {
        return Err(RepoError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }
    for table in REQUIRED_TABLES {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(table: &str, column: &str, value: i64) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in {table}.{column}"
        ))),
    }
}
