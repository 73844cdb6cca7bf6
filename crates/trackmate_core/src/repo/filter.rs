//! Composable WHERE-clause builder used by the generic repositories.
//!
//! Column and table names are always `'static` identifiers from code; user
//! values only ever travel as bound parameters.

use rusqlite::types::Value;

/// Many-to-many link table between the queried table and another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    pub table: &'static str,
    /// Column pointing at the queried table's `id`.
    pub near: &'static str,
    /// Column pointing at the other side.
    pub far: &'static str,
}

impl LinkTable {
    /// Same link table, seen from the other side.
    pub const fn reversed(self) -> Self {
        Self {
            table: self.table,
            near: self.far,
            far: self.near,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    Eq {
        column: &'static str,
        value: Value,
    },
    LinkedToAny {
        link: LinkTable,
        ids: Vec<i64>,
    },
    Linked {
        link: LinkTable,
    },
}

/// Conjunction of conditions; an empty filter matches every visible row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `column = value`.
    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq {
            column,
            value: value.into(),
        });
        self
    }

    /// `column = value` when `value` is set; no-op otherwise.
    pub fn eq_opt(self, column: &'static str, value: Option<String>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    /// Rows linked through `link` to at least one of `ids`.
    ///
    /// Uses a correlated `EXISTS`, so a row matching several ids is still
    /// returned once.
    pub fn linked_to_any(mut self, link: LinkTable, ids: Option<Vec<i64>>) -> Self {
        if let Some(ids) = ids {
            self.conditions.push(Condition::LinkedToAny { link, ids });
        }
        self
    }

    /// Rows that appear at least once in `link`.
    pub fn linked(mut self, link: LinkTable) -> Self {
        self.conditions.push(Condition::Linked { link });
        self
    }

    /// Renders `AND`-joinable clauses for `table` plus their bound values.
    pub(crate) fn render(&self, table: &str) -> (Vec<String>, Vec<Value>) {
        let mut clauses = Vec::with_capacity(self.conditions.len());
        let mut values = Vec::new();
        for condition in &self.conditions {
            match condition {
                Condition::Eq { column, value } => {
                    clauses.push(format!("{table}.{column} = ?"));
                    values.push(value.clone());
                }
                Condition::LinkedToAny { ids, .. } if ids.is_empty() => {
                    // An explicit empty id set can match nothing.
                    clauses.push("0 = 1".to_string());
                }
                Condition::LinkedToAny { link, ids } => {
                    let placeholders = vec!["?"; ids.len()].join(", ");
                    clauses.push(format!(
                        "EXISTS (SELECT 1 FROM {link_table} l WHERE l.{near} = {table}.id AND l.{far} IN ({placeholders}))",
                        link_table = link.table,
                        near = link.near,
                        far = link.far,
                    ));
                    values.extend(ids.iter().map(|id| Value::Integer(*id)));
                }
                Condition::Linked { link } => {
                    clauses.push(format!(
                        "EXISTS (SELECT 1 FROM {link_table} l WHERE l.{near} = {table}.id)",
                        link_table = link.table,
                        near = link.near,
                    ));
                }
            }
        }
        (clauses, values)
    }
}
