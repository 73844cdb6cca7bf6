//! Generic owner-scoped and catalog repositories.
//!
//! # Responsibility
//! - Apply the `owner = caller` restriction to every statement issued for an
//!   owned entity, including inserts.
//! - Provide get-or-create on a natural key that is safe when several
//!   connections race on the same key.
//!
//! # Invariants
//! - `OwnedRepository` is bound to one owner at construction and cannot
//!   issue a statement without that owner in its WHERE clause or VALUES.
//! - `CatalogRepository` is the only unscoped access path and is named as
//!   such at every call site.
//! - Lists are ordered by `id DESC` (most recent first).

use crate::model::user::{Caller, UserId};
use crate::repo::filter::Filter;
use crate::repo::{RepoError, RepoResult};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;

/// Attempts made by get-or-create before giving up on a vanishing row.
const GET_OR_CREATE_ATTEMPTS: usize = 3;

/// Column/value pairs for inserts and updates.
pub type Columns = Vec<(&'static str, Value)>;

/// Persistence description of an entity that belongs to a user.
pub trait OwnedEntity: Sized {
    /// Human-readable entity name used in errors and logs.
    const ENTITY: &'static str;
    const TABLE: &'static str;
    const OWNER_COLUMN: &'static str;
    /// Selected columns, in the order `from_row` expects.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

fn select_sql<E: OwnedEntity>() -> String {
    let columns = E::COLUMNS
        .iter()
        .map(|column| format!("{}.{column}", E::TABLE))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {columns} FROM {}", E::TABLE)
}

fn query_rows<E: OwnedEntity>(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
) -> RepoResult<Vec<E>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(values))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(E::from_row(row)?);
    }
    Ok(out)
}

fn where_sql(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

/// Repository whose every statement is restricted to one owner.
pub struct OwnedRepository<'conn, E> {
    conn: &'conn Connection,
    owner: UserId,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: OwnedEntity> OwnedRepository<'conn, E> {
    pub fn new(conn: &'conn Connection, caller: &Caller) -> Self {
        Self {
            conn,
            owner: caller.id(),
            _entity: PhantomData,
        }
    }

    /// Lists owned rows matching `filter`, most recent first.
    pub fn list(&self, filter: &Filter) -> RepoResult<Vec<E>> {
        let (mut clauses, mut values) = filter.render(E::TABLE);
        clauses.insert(0, format!("{}.{} = ?", E::TABLE, E::OWNER_COLUMN));
        values.insert(0, Value::Integer(self.owner));
        let sql = format!(
            "{}{} ORDER BY {}.id DESC;",
            select_sql::<E>(),
            where_sql(&clauses),
            E::TABLE
        );
        query_rows(self.conn, &sql, values)
    }

    /// Loads one owned row, or `None` if absent or owned by someone else.
    pub fn find(&self, id: i64) -> RepoResult<Option<E>> {
        let sql = format!(
            "{} WHERE {table}.id = ?1 AND {table}.{owner} = ?2;",
            select_sql::<E>(),
            table = E::TABLE,
            owner = E::OWNER_COLUMN
        );
        let mut rows = query_rows(
            self.conn,
            &sql,
            vec![Value::Integer(id), Value::Integer(self.owner)],
        )?;
        Ok(rows.pop())
    }

    /// Loads one owned row or fails with `NotFound`.
    pub fn get(&self, id: i64) -> RepoResult<E> {
        self.find(id)?.ok_or(RepoError::NotFound {
            entity: E::ENTITY,
            id,
        })
    }

    /// Inserts a row owned by the bound owner and returns its id.
    ///
    /// The owner column is always written from the bound owner; `columns`
    /// must not contain it.
    pub fn insert(&self, columns: &[(&'static str, Value)]) -> RepoResult<i64> {
        let mut names = vec![E::OWNER_COLUMN];
        let mut values = vec![Value::Integer(self.owner)];
        for (name, value) in columns {
            debug_assert_ne!(*name, E::OWNER_COLUMN, "owner column is bound by the repository");
            names.push(*name);
            values.push(value.clone());
        }
        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            E::TABLE,
            names.join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(values))
            .map_err(RepoError::on_unique(E::ENTITY))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Overwrites `columns` of one owned row.
    pub fn update(&self, id: i64, columns: &[(&'static str, Value)]) -> RepoResult<()> {
        if columns.is_empty() {
            return self.get(id).map(|_| ());
        }
        let assignments = columns
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<Value> = columns.iter().map(|(_, value)| value.clone()).collect();
        values.push(Value::Integer(id));
        values.push(Value::Integer(self.owner));
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE id = ? AND {} = ?;",
            E::TABLE,
            E::OWNER_COLUMN
        );
        let changed = self
            .conn
            .execute(&sql, params_from_iter(values))
            .map_err(RepoError::on_unique(E::ENTITY))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: E::ENTITY,
                id,
            });
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepoResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ?1 AND {} = ?2;",
            E::TABLE,
            E::OWNER_COLUMN
        );
        let changed = self
            .conn
            .execute(&sql, [Value::Integer(id), Value::Integer(self.owner)])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: E::ENTITY,
                id,
            });
        }
        Ok(())
    }

    /// Returns the id of the owned row whose columns equal `key`, inserting it
    /// first when no such row exists.
    ///
    /// The table must carry a UNIQUE index over the owner column plus every
    /// column in `key`. The insert skips on conflict and the follow-up lookup
    /// reads whichever row won, so concurrent callers converge on one row.
    /// A lookup miss means the winning row was deleted in between; the
    /// operation is retried a bounded number of times.
    pub fn get_or_create(&self, key: &[(&'static str, Value)]) -> RepoResult<i64> {
        let mut names = vec![E::OWNER_COLUMN];
        let mut values = vec![Value::Integer(self.owner)];
        for (name, value) in key {
            names.push(*name);
            values.push(value.clone());
        }
        let placeholders = vec!["?"; names.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders}) ON CONFLICT DO NOTHING;",
            E::TABLE,
            names.join(", ")
        );
        let lookup_sql = format!(
            "SELECT id FROM {} WHERE {} LIMIT 1;",
            E::TABLE,
            names
                .iter()
                .map(|name| format!("{name} IS ?"))
                .collect::<Vec<_>>()
                .join(" AND ")
        );

        for attempt in 1..=GET_OR_CREATE_ATTEMPTS {
            let inserted = self
                .conn
                .execute(&insert_sql, params_from_iter(values.iter()))?;
            if inserted == 1 {
                return Ok(self.conn.last_insert_rowid());
            }
            let existing: Option<i64> = self
                .conn
                .query_row(&lookup_sql, params_from_iter(values.iter()), |row| row.get(0))
                .optional()?;
            if let Some(id) = existing {
                return Ok(id);
            }
            warn!(
                "event=get_or_create module=repo status=retry entity={} owner={} attempt={}",
                E::ENTITY,
                self.owner,
                attempt
            );
        }
        Err(RepoError::UniqueViolation { entity: E::ENTITY })
    }
}

/// Unscoped repository for catalog-style access.
///
/// Only the book catalog and track discovery use it; owned data goes
/// through [`OwnedRepository`].
pub struct CatalogRepository<'conn, E> {
    conn: &'conn Connection,
    _entity: PhantomData<fn() -> E>,
}

impl<'conn, E: OwnedEntity> CatalogRepository<'conn, E> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _entity: PhantomData,
        }
    }

    pub fn list(&self, filter: &Filter) -> RepoResult<Vec<E>> {
        let (clauses, values) = filter.render(E::TABLE);
        let sql = format!(
            "{}{} ORDER BY {}.id DESC;",
            select_sql::<E>(),
            where_sql(&clauses),
            E::TABLE
        );
        query_rows(self.conn, &sql, values)
    }

    pub fn find(&self, id: i64) -> RepoResult<Option<E>> {
        let sql = format!("{} WHERE {}.id = ?1;", select_sql::<E>(), E::TABLE);
        let mut rows = query_rows(self.conn, &sql, vec![Value::Integer(id)])?;
        Ok(rows.pop())
    }

    pub fn get(&self, id: i64) -> RepoResult<E> {
        self.find(id)?.ok_or(RepoError::NotFound {
            entity: E::ENTITY,
            id,
        })
    }

    pub fn update(&self, id: i64, columns: &[(&'static str, Value)]) -> RepoResult<()> {
        if columns.is_empty() {
            return self.get(id).map(|_| ());
        }
        let assignments = columns
            .iter()
            .map(|(name, _)| format!("{name} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut values: Vec<Value> = columns.iter().map(|(_, value)| value.clone()).collect();
        values.push(Value::Integer(id));
        let sql = format!("UPDATE {} SET {assignments} WHERE id = ?;", E::TABLE);
        let changed = self
            .conn
            .execute(&sql, params_from_iter(values))
            .map_err(RepoError::on_unique(E::ENTITY))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: E::ENTITY,
                id,
            });
        }
        Ok(())
    }

    pub fn delete(&self, id: i64) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?1;", E::TABLE);
        let changed = self.conn.execute(&sql, [Value::Integer(id)])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: E::ENTITY,
                id,
            });
        }
        Ok(())
    }
}
