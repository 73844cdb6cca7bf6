//! Book catalog use-cases.
//!
//! Creation is per caller and idempotent on the full payload; reads and
//! writes by id go through the unscoped catalog.

use crate::model::book::{Book, BookId, BookInput, BookPatch};
use crate::model::user::Caller;
use crate::repo::book_repo::{book_columns, book_filter};
use crate::repo::ensure_connection_ready;
use crate::repo::owned::{CatalogRepository, OwnedRepository};
use crate::service::CoreResult;
use log::info;
use rusqlite::Connection;

pub struct BookService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BookService<'conn> {
    pub fn new(conn: &'conn Connection) -> CoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn catalog(&self) -> CatalogRepository<'conn, Book> {
        CatalogRepository::new(self.conn)
    }

    /// Every book, most recent first. `assigned_only` keeps books used by at
    /// least one track.
    pub fn list(&self, _caller: &Caller, assigned_only: bool) -> CoreResult<Vec<Book>> {
        Ok(self.catalog().list(&book_filter(assigned_only))?)
    }

    pub fn get(&self, _caller: &Caller, id: BookId) -> CoreResult<Book> {
        Ok(self.catalog().get(id)?)
    }

    /// Returns the caller's book with exactly these fields, creating it if
    /// needed.
    pub fn create(&self, caller: &Caller, input: &BookInput) -> CoreResult<Book> {
        input.validate()?;
        let id = OwnedRepository::<Book>::new(self.conn, caller).get_or_create(&book_columns(input))?;
        info!(
            "event=book_create module=book status=ok user_id={} book_id={id}",
            caller.id()
        );
        Ok(self.catalog().get(id)?)
    }

    pub fn update(&self, _caller: &Caller, id: BookId, patch: BookPatch) -> CoreResult<Book> {
        let catalog = self.catalog();
        let merged = catalog.get(id)?.apply(patch);
        merged.validate()?;
        catalog.update(id, &book_columns(&merged))?;
        Ok(catalog.get(id)?)
    }

    pub fn delete(&self, caller: &Caller, id: BookId) -> CoreResult<()> {
        self.catalog().delete(id)?;
        info!(
            "event=book_delete module=book status=ok user_id={} book_id={id}",
            caller.id()
        );
        Ok(())
    }
}
