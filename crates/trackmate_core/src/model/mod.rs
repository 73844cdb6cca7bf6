//! Domain model for users, profiles, books, tasks, tracks and progress rows.
//!
//! # Responsibility
//! - Define the records persisted by the repository layer.
//! - Define create/patch payloads and their field validation rules.
//! - Define per-view field projections.
//!
//! # Invariants
//! - Every identifier is system-assigned and never reused.
//! - Payload types carry no owner field; ownership comes from the caller.

pub mod book;
pub mod profile;
pub mod projection;
pub mod task;
pub mod track;
pub mod user;
pub mod user_data;
pub mod validation;
pub mod weak_ref;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
