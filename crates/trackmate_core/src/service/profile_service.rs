//! Profile use-cases. One profile per user; the owner always comes from the
//! caller, never from the payload.

use crate::model::profile::{Profile, ProfileId, ProfileInput, ProfilePatch};
use crate::model::user::Caller;
use crate::repo::ensure_connection_ready;
use crate::repo::filter::Filter;
use crate::repo::owned::OwnedRepository;
use crate::repo::profile_repo::profile_columns;
use crate::service::CoreResult;
use log::info;
use rusqlite::Connection;

pub struct ProfileService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ProfileService<'conn> {
    pub fn new(conn: &'conn Connection) -> CoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn repo(&self, caller: &Caller) -> OwnedRepository<'conn, Profile> {
        OwnedRepository::new(self.conn, caller)
    }

    /// Caller's profiles, most recent first (at most one row).
    pub fn list(&self, caller: &Caller) -> CoreResult<Vec<Profile>> {
        Ok(self.repo(caller).list(&Filter::new())?)
    }

    pub fn get(&self, caller: &Caller, id: ProfileId) -> CoreResult<Profile> {
        Ok(self.repo(caller).get(id)?)
    }

    /// Creates the caller's profile; a second one fails with `Conflict`.
    pub fn create(&self, caller: &Caller, input: &ProfileInput) -> CoreResult<Profile> {
        input.validate()?;
        let repo = self.repo(caller);
        let id = repo.insert(&profile_columns(input))?;
        info!(
            "event=profile_create module=profile status=ok user_id={} profile_id={id}",
            caller.id()
        );
        Ok(repo.get(id)?)
    }

    pub fn update(&self, caller: &Caller, id: ProfileId, patch: ProfilePatch) -> CoreResult<Profile> {
        let repo = self.repo(caller);
        let merged = repo.get(id)?.apply(patch);
        merged.validate()?;
        repo.update(id, &profile_columns(&merged))?;
        Ok(repo.get(id)?)
    }

    pub fn delete(&self, caller: &Caller, id: ProfileId) -> CoreResult<()> {
        self.repo(caller).delete(id)?;
        info!(
            "event=profile_delete module=profile status=ok user_id={} profile_id={id}",
            caller.id()
        );
        Ok(())
    }
}
