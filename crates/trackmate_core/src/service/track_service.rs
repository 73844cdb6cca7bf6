//! Track use-cases: the aggregate root over books and tasks.
//!
//! # Responsibility
//! - Owner-scoped list/get/create/update/delete of tracks, with nested book
//!   and task payloads resolved through per-caller get-or-create.
//! - Image upload and replacement through an [`ImageStore`].
//! - Unscoped discovery reads (`browse`, `browse_get`).
//!
//! # Invariants
//! - Create and update run in one immediate transaction; a failure leaves
//!   neither the track row nor its links half-written.
//! - Update replaces a link set only when its nested payload is present.

use crate::media::{ImageStore, TRACK_IMAGE_NAMESPACE};
use crate::model::book::{Book, BookId, BookInput};
use crate::model::now_epoch_ms;
use crate::model::task::{Task, TaskId, TaskInput};
use crate::model::track::{
    DiscoveryFilter, ImageUpload, Track, TrackAggregate, TrackFilter, TrackId, TrackImage,
    TrackInput, TrackPatch,
};
use crate::model::user::Caller;
use crate::model::validation::ValidationError;
use crate::repo::book_repo::book_columns;
use crate::repo::ensure_connection_ready;
use crate::repo::owned::{CatalogRepository, OwnedRepository};
use crate::repo::profile_repo::find_profile_by_user;
use crate::repo::task_repo::task_columns;
use crate::repo::track_repo::{
    discovery_filter, load_aggregate, profile_column, replace_links, track_columns, track_filter,
    TRACK_BOOKS, TRACK_TASKS,
};
use crate::service::{CoreError, CoreResult};
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::time::Instant;

pub struct TrackService<'a> {
    conn: &'a Connection,
    images: &'a dyn ImageStore,
}

impl<'a> TrackService<'a> {
    pub fn new(conn: &'a Connection, images: &'a dyn ImageStore) -> CoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn, images })
    }

    fn repo(&self, caller: &Caller) -> OwnedRepository<'a, Track> {
        OwnedRepository::new(self.conn, caller)
    }

    /// Caller's tracks matching `filter`, most recent first, each once.
    pub fn list(&self, caller: &Caller, filter: TrackFilter) -> CoreResult<Vec<TrackAggregate>> {
        self.repo(caller)
            .list(&track_filter(filter))?
            .into_iter()
            .map(|track| load_aggregate(self.conn, track).map_err(CoreError::from))
            .collect()
    }

    pub fn get(&self, caller: &Caller, id: TrackId) -> CoreResult<TrackAggregate> {
        let track = self.repo(caller).get(id)?;
        Ok(load_aggregate(self.conn, track)?)
    }

    /// Creates a track led by the caller and attached to the caller's
    /// profile, if any.
    pub fn create(&self, caller: &Caller, input: &TrackInput) -> CoreResult<TrackAggregate> {
        input.validate()?;
        let started_at = Instant::now();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let id = {
            let profile_id = find_profile_by_user(&tx, caller.id())?.map(|profile| profile.id);
            let published_date = input.published_date.unwrap_or_else(now_epoch_ms);
            let mut columns = track_columns(input, published_date);
            columns.push(profile_column(profile_id));
            let id = OwnedRepository::<Track>::new(&tx, caller).insert(&columns)?;

            let book_ids = resolve_books(&tx, caller, &input.books)?;
            let task_ids = resolve_tasks(&tx, caller, &input.tasks)?;
            replace_links(&tx, TRACK_BOOKS, id, &book_ids)?;
            replace_links(&tx, TRACK_TASKS, id, &task_ids)?;
            id
        };
        tx.commit()?;

        info!(
            "event=track_create module=track status=ok user_id={} track_id={id} books={} tasks={} duration_ms={}",
            caller.id(),
            input.books.len(),
            input.tasks.len(),
            started_at.elapsed().as_millis()
        );
        self.get(caller, id)
    }

    /// Applies `patch` to one of the caller's tracks.
    ///
    /// A present `book`/`task` payload (even empty) replaces that link set;
    /// an absent one leaves it untouched.
    pub fn update(
        &self,
        caller: &Caller,
        id: TrackId,
        patch: &TrackPatch,
    ) -> CoreResult<TrackAggregate> {
        let started_at = Instant::now();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let repo = OwnedRepository::<Track>::new(&tx, caller);
            let current = repo.get(id)?;
            let merged = current.apply(patch);
            merged.validate()?;
            for book in patch.books.iter().flatten() {
                book.validate()?;
            }
            for task in patch.tasks.iter().flatten() {
                task.validate()?;
            }

            if let Some(books) = &patch.books {
                let book_ids = resolve_books(&tx, caller, books)?;
                replace_links(&tx, TRACK_BOOKS, id, &book_ids)?;
            }
            if let Some(tasks) = &patch.tasks {
                let task_ids = resolve_tasks(&tx, caller, tasks)?;
                replace_links(&tx, TRACK_TASKS, id, &task_ids)?;
            }

            let published_date = merged.published_date.unwrap_or(current.published_date);
            repo.update(id, &track_columns(&merged, published_date))?;
        }
        tx.commit()?;

        info!(
            "event=track_update module=track status=ok user_id={} track_id={id} books_replaced={} tasks_replaced={} duration_ms={}",
            caller.id(),
            patch.books.is_some(),
            patch.tasks.is_some(),
            started_at.elapsed().as_millis()
        );
        self.get(caller, id)
    }

    /// Deletes one of the caller's tracks and, best-effort, its image.
    pub fn delete(&self, caller: &Caller, id: TrackId) -> CoreResult<()> {
        let repo = self.repo(caller);
        let track = repo.get(id)?;
        repo.delete(id)?;
        if let Some(image) = track.image {
            self.discard_image(&image);
        }
        info!(
            "event=track_delete module=track status=ok user_id={} track_id={id}",
            caller.id()
        );
        Ok(())
    }

    /// Stores `upload` as the image of one of the caller's tracks.
    ///
    /// Ownership is checked first, so a foreign track reports `NotFound`
    /// even when no file is supplied. The previous image is read and
    /// replaced under one immediate transaction, so concurrent uploads each
    /// discard the image they actually replaced.
    pub fn upload_image(
        &self,
        caller: &Caller,
        id: TrackId,
        upload: Option<ImageUpload>,
    ) -> CoreResult<TrackImage> {
        self.repo(caller).get(id)?;
        let upload = upload
            .filter(|upload| !upload.bytes.is_empty())
            .ok_or(CoreError::Validation(ValidationError::Missing { field: "image" }))?;

        let reference = self
            .images
            .put(TRACK_IMAGE_NAMESPACE, &upload.file_name, &upload.bytes)?;
        let previous = match self.swap_image(caller, id, &reference) {
            Ok(previous) => previous,
            Err(err) => {
                self.discard_image(&reference);
                return Err(err);
            }
        };
        if let Some(previous) = previous {
            self.discard_image(&previous);
        }

        info!(
            "event=track_image_upload module=track status=ok user_id={} track_id={id} bytes={}",
            caller.id(),
            upload.bytes.len()
        );
        Ok(TrackImage {
            id,
            image: reference,
        })
    }

    /// Every track matching `filter`, regardless of leader.
    pub fn browse(&self, filter: DiscoveryFilter) -> CoreResult<Vec<TrackAggregate>> {
        CatalogRepository::<Track>::new(self.conn)
            .list(&discovery_filter(filter))?
            .into_iter()
            .map(|track| load_aggregate(self.conn, track).map_err(CoreError::from))
            .collect()
    }

    /// Any track by id, regardless of leader.
    pub fn browse_get(&self, id: TrackId) -> CoreResult<TrackAggregate> {
        let track = CatalogRepository::<Track>::new(self.conn).get(id)?;
        Ok(load_aggregate(self.conn, track)?)
    }

    /// Points the track at `reference` and returns the image it replaced.
    fn swap_image(
        &self,
        caller: &Caller,
        id: TrackId,
        reference: &str,
    ) -> CoreResult<Option<String>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let previous = {
            let repo = OwnedRepository::<Track>::new(&tx, caller);
            let previous = repo.get(id)?.image;
            repo.update(id, &[("image", Value::Text(reference.to_string()))])?;
            previous
        };
        tx.commit()?;
        Ok(previous)
    }

    fn discard_image(&self, reference: &str) {
        if let Err(err) = self.images.remove(reference) {
            warn!("event=media_remove module=track status=error error={err}");
        }
    }
}

fn resolve_books(conn: &Connection, caller: &Caller, inputs: &[BookInput]) -> CoreResult<Vec<BookId>> {
    let repo = OwnedRepository::<Book>::new(conn, caller);
    inputs
        .iter()
        .map(|input| repo.get_or_create(&book_columns(input)).map_err(CoreError::from))
        .collect()
}

fn resolve_tasks(conn: &Connection, caller: &Caller, inputs: &[TaskInput]) -> CoreResult<Vec<TaskId>> {
    let repo = OwnedRepository::<Task>::new(conn, caller);
    inputs
        .iter()
        .map(|input| repo.get_or_create(&task_columns(input)).map_err(CoreError::from))
        .collect()
}
