//! Runtime configuration read from environment variables.
//!
//! | Variable               | Default                  |
//! |------------------------|--------------------------|
//! | `TRACKMATE_DB_PATH`    | `./data/trackmate.db`    |
//! | `TRACKMATE_MEDIA_ROOT` | `./media`                |
//! | `TRACKMATE_LOG_LEVEL`  | `debug` / `info` (build) |
//! | `TRACKMATE_LOG_DIR`    | unset: logging disabled  |

use crate::logging::LogLevel;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_KEY: &str = "TRACKMATE_DB_PATH";
pub const MEDIA_ROOT_KEY: &str = "TRACKMATE_MEDIA_ROOT";
pub const LOG_LEVEL_KEY: &str = "TRACKMATE_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "TRACKMATE_LOG_DIR";

const DEFAULT_DB_PATH: &str = "./data/trackmate.db";
const DEFAULT_MEDIA_ROOT: &str = "./media";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub media_root: PathBuf,
    pub log_level: LogLevel,
    /// Absolute directory for rolling log files; `None` disables logging.
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid {key}=`{value}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let log_level = match get(LOG_LEVEL_KEY) {
            Some(value) => value.parse::<LogLevel>().map_err(|err| ConfigError::InvalidValue {
                key: LOG_LEVEL_KEY,
                value: value.clone(),
                reason: format!("{err}"),
            })?,
            None => LogLevel::default_for_build(),
        };

        let log_dir = match get(LOG_DIR_KEY).map(PathBuf::from) {
            Some(dir) if !dir.is_absolute() => {
                return Err(ConfigError::InvalidValue {
                    key: LOG_DIR_KEY,
                    value: dir.display().to_string(),
                    reason: "must be an absolute path".to_string(),
                })
            }
            other => other,
        };

        Ok(Self {
            db_path: PathBuf::from(get(DB_PATH_KEY).unwrap_or_else(|| DEFAULT_DB_PATH.to_string())),
            media_root: PathBuf::from(
                get(MEDIA_ROOT_KEY).unwrap_or_else(|| DEFAULT_MEDIA_ROOT.to_string()),
            ),
            log_level,
            log_dir,
        })
    }
}
