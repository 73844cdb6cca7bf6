//! Book persistence.
//!
//! Books are created per user (the natural key includes the creator) but read
//! and modified through the catalog path.

use crate::model::book::{Book, BookInput};
use crate::repo::filter::{Filter, LinkTable};
use crate::repo::owned::{Columns, OwnedEntity};
use crate::repo::RepoResult;
use rusqlite::types::Value;
use rusqlite::Row;

/// `track_books`, seen from the book side.
pub const BOOK_TRACKS: LinkTable = crate::repo::track_repo::TRACK_BOOKS.reversed();

impl OwnedEntity for Book {
    const ENTITY: &'static str = "book";
    const TABLE: &'static str = "books";
    const OWNER_COLUMN: &'static str = "user_id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "title",
        "sub_title",
        "author",
        "image_url",
        "isbn",
        "publisher",
        "published_date",
    ];

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            sub_title: row.get(3)?,
            author: row.get(4)?,
            image_url: row.get(5)?,
            isbn: row.get(6)?,
            publisher: row.get(7)?,
            published_date: row.get(8)?,
        })
    }
}

/// Every stored column except `id` and the owner; also the natural key.
pub fn book_columns(input: &BookInput) -> Columns {
    vec![
        ("title", Value::Text(input.title.clone())),
        ("sub_title", Value::Text(input.sub_title.clone())),
        ("author", Value::Text(input.author.clone())),
        ("image_url", Value::Text(input.image_url.clone())),
        ("isbn", Value::Text(input.isbn.clone())),
        ("publisher", Value::Text(input.publisher.clone())),
        ("published_date", Value::Text(input.published_date.clone())),
    ]
}

/// Catalog filter; `assigned_only` keeps books attached to some track.
pub fn book_filter(assigned_only: bool) -> Filter {
    let filter = Filter::new();
    if assigned_only {
        filter.linked(BOOK_TRACKS)
    } else {
        filter
    }
}
