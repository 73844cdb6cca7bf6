//! Core of the trackmate study-track backend.
//!
//! Storage bootstrap, the data model, owner-scoped repositories and the
//! use-case services an access layer calls on behalf of an authenticated
//! caller.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod media;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{init_from_config, init_logging, logging_status, LogLevel, LoggingError};
pub use media::{FsImageStore, ImageStore};
pub use model::projection::{Project, Projection, View};
pub use model::user::{Caller, Credentials};
pub use repo::{RepoError, RepoResult};
pub use service::book_service::BookService;
pub use service::identity_service::IdentityService;
pub use service::profile_service::ProfileService;
pub use service::progress_service::ProgressService;
pub use service::task_service::TaskService;
pub use service::track_service::TrackService;
pub use service::{CoreError, CoreResult};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
