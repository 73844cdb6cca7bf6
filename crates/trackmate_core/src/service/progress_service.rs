//! Progress (user data) use-cases.
//!
//! `track_id` is stored exactly as submitted. Nothing here checks that the
//! track exists; [`ProgressService::get_with_track`] treats it as an
//! optional lookup.

use crate::model::now_epoch_ms;
use crate::model::track::Track;
use crate::model::user::Caller;
use crate::model::user_data::{UserData, UserDataId, UserDataInput, UserDataPatch};
use crate::repo::ensure_connection_ready;
use crate::repo::filter::Filter;
use crate::repo::owned::{CatalogRepository, OwnedRepository};
use crate::repo::user_data_repo::user_data_columns;
use crate::service::CoreResult;
use log::info;
use rusqlite::Connection;

pub struct ProgressService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ProgressService<'conn> {
    pub fn new(conn: &'conn Connection) -> CoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn repo(&self, caller: &Caller) -> OwnedRepository<'conn, UserData> {
        OwnedRepository::new(self.conn, caller)
    }

    pub fn list(&self, caller: &Caller) -> CoreResult<Vec<UserData>> {
        Ok(self.repo(caller).list(&Filter::new())?)
    }

    pub fn get(&self, caller: &Caller, id: UserDataId) -> CoreResult<UserData> {
        Ok(self.repo(caller).get(id)?)
    }

    /// Progress row plus the track it points at, if that track still exists.
    pub fn get_with_track(
        &self,
        caller: &Caller,
        id: UserDataId,
    ) -> CoreResult<(UserData, Option<Track>)> {
        let row = self.get(caller, id)?;
        let catalog = CatalogRepository::<Track>::new(self.conn);
        let track = row.track_id.resolve(|track_id| catalog.find(track_id))?;
        Ok((row, track))
    }

    /// Records progress; `action_date` defaults to now and `is_done` to false.
    pub fn create(&self, caller: &Caller, input: &UserDataInput) -> CoreResult<UserData> {
        let repo = self.repo(caller);
        let action_date = input.action_date.unwrap_or_else(now_epoch_ms);
        let id = repo.insert(&user_data_columns(input, action_date))?;
        info!(
            "event=progress_create module=progress status=ok user_id={} user_data_id={id} track_id={}",
            caller.id(),
            input.track_id
        );
        Ok(repo.get(id)?)
    }

    pub fn update(
        &self,
        caller: &Caller,
        id: UserDataId,
        patch: UserDataPatch,
    ) -> CoreResult<UserData> {
        let repo = self.repo(caller);
        let current = repo.get(id)?;
        let action_date = patch.action_date.unwrap_or(current.action_date);
        let merged = current.apply(patch);
        repo.update(id, &user_data_columns(&merged, action_date))?;
        Ok(repo.get(id)?)
    }

    pub fn delete(&self, caller: &Caller, id: UserDataId) -> CoreResult<()> {
        self.repo(caller).delete(id)?;
        info!(
            "event=progress_delete module=progress status=ok user_id={} user_data_id={id}",
            caller.id()
        );
        Ok(())
    }
}
