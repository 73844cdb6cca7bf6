#![allow(dead_code)]

use rusqlite::Connection;
use trackmate_core::model::book::BookInput;
use trackmate_core::model::task::TaskInput;
use trackmate_core::model::track::TrackInput;
use trackmate_core::model::user::NewUser;
use trackmate_core::{Caller, Credentials, IdentityService};

pub const PASSWORD: &str = "s3cret-pass";

/// Registers `email` and resolves it into a caller.
pub fn signup(conn: &Connection, email: &str) -> Caller {
    let identity = IdentityService::new(conn).unwrap();
    identity
        .register(&NewUser {
            email: email.to_string(),
            name: email.split('@').next().unwrap_or_default().to_string(),
            password: Some(PASSWORD.to_string()),
        })
        .unwrap();
    identity
        .resolve_identity(&Credentials::Password {
            email: email.to_string(),
            password: PASSWORD.to_string(),
        })
        .unwrap()
}

pub fn book(title: &str) -> BookInput {
    BookInput {
        title: title.to_string(),
        author: "Y".to_string(),
        isbn: "978-0000000000".to_string(),
        publisher: "Pub".to_string(),
        ..BookInput::default()
    }
}

pub fn task(name: &str) -> TaskInput {
    TaskInput {
        order_major: "1".to_string(),
        task_name: name.to_string(),
        ..TaskInput::default()
    }
}

pub fn track(name: &str) -> TrackInput {
    TrackInput {
        subject_major: "math".to_string(),
        subject_minor: "algebra".to_string(),
        target_test: "sat".to_string(),
        target_grade: "A".to_string(),
        track_name: name.to_string(),
        ..TrackInput::default()
    }
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0))
        .unwrap()
}
