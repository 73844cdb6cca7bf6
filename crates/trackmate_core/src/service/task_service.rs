//! Task use-cases, scoped to the task's creator.

use crate::model::task::{Task, TaskId, TaskInput, TaskPatch};
use crate::model::user::Caller;
use crate::repo::ensure_connection_ready;
use crate::repo::owned::OwnedRepository;
use crate::repo::task_repo::{task_columns, task_filter};
use crate::service::CoreResult;
use log::info;
use rusqlite::Connection;

pub struct TaskService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> TaskService<'conn> {
    pub fn new(conn: &'conn Connection) -> CoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn repo(&self, caller: &Caller) -> OwnedRepository<'conn, Task> {
        OwnedRepository::new(self.conn, caller)
    }

    /// Caller's tasks, most recent first. `assigned_only` keeps tasks used by
    /// at least one track.
    pub fn list(&self, caller: &Caller, assigned_only: bool) -> CoreResult<Vec<Task>> {
        Ok(self.repo(caller).list(&task_filter(assigned_only))?)
    }

    pub fn get(&self, caller: &Caller, id: TaskId) -> CoreResult<Task> {
        Ok(self.repo(caller).get(id)?)
    }

    /// Returns the caller's task with exactly these fields, creating it if
    /// needed.
    pub fn create(&self, caller: &Caller, input: &TaskInput) -> CoreResult<Task> {
        input.validate()?;
        let repo = self.repo(caller);
        let id = repo.get_or_create(&task_columns(input))?;
        info!(
            "event=task_create module=task status=ok user_id={} task_id={id}",
            caller.id()
        );
        Ok(repo.get(id)?)
    }

    pub fn update(&self, caller: &Caller, id: TaskId, patch: TaskPatch) -> CoreResult<Task> {
        let repo = self.repo(caller);
        let merged = repo.get(id)?.apply(patch);
        merged.validate()?;
        repo.update(id, &task_columns(&merged))?;
        Ok(repo.get(id)?)
    }

    pub fn delete(&self, caller: &Caller, id: TaskId) -> CoreResult<()> {
        self.repo(caller).delete(id)?;
        info!(
            "event=task_delete module=task status=ok user_id={} task_id={id}",
            caller.id()
        );
        Ok(())
    }
}
