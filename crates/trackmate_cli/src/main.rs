//! CLI bootstrap entry point.
//!
//! # Responsibility
//! - Load configuration (`.env` first, then the process environment).
//! - Start logging when a log directory is configured.
//! - Open and migrate the database, then print a short status report.

use log::info;
use std::process::ExitCode;
use trackmate_core::db::migrations::current_version;
use trackmate_core::db::open_db;
use trackmate_core::{core_version, init_from_config, ping, CoreConfig};

fn main() -> ExitCode {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("trackmate: ignoring unreadable .env: {err}");
        }
    }

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("trackmate: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    let logging = init_from_config(&config).map_err(|err| err.to_string())?;

    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let schema_version = current_version(&conn).map_err(|err| err.to_string())?;
    info!(
        "event=cli_start module=cli status=ok schema_version={schema_version} logging={logging}"
    );

    println!("trackmate_core ping={}", ping());
    println!("trackmate_core version={}", core_version());
    println!("db_path={}", config.db_path.display());
    println!("schema_version={schema_version}");
    println!("media_root={}", config.media_root.display());
    Ok(())
}
