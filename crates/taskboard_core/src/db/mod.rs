//! SQLite board store: connection bootstrap, schema and migrations.
//!
//! # Responsibility
//! - Open connections with foreign keys enforced and a busy timeout.
//! - Bring the schema for boards, ownership records, task lists and tasks up
//!   to the latest migration.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - Lists reference boards and tasks reference lists; rows are archived,
//!   never deleted, so references stay valid.
//! - Repositories refuse connections whose schema is not fully migrated.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

/// Table names repositories check before they accept a connection.
pub mod tables {
    pub const BOARDS: &str = "boards";
    pub const BOARD_OWNERSHIPS: &str = "board_ownerships";
    pub const TASK_LISTS: &str = "task_lists";
    pub const TASKS: &str = "tasks";
}

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the board store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was migrated by a newer build of the board store.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "board store schema v{db_version} is newer than this build (v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
