//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-aggregate store contracts consumed by services.
//! - Isolate SQLite query details from business orchestration.
//! - Provide the transaction scope coordinators run their work in.
//!
//! # Invariants
//! - Sibling queries exclude archived rows and order by
//!   `position ASC, <id> ASC`.
//! - Lookups by id return archived rows too; callers decide what archived
//!   means for them.
//! - Patch updates only touch the columns that are set.

pub mod board_repo;
pub mod board_view_cache;
pub mod task_list_repo;
pub mod task_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error shared by all repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// An update targeted a row that does not exist.
    NotFound { entity: &'static str, id: Uuid },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repositories require schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board repositories require table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Runs a closure as one atomic unit of storage work.
pub trait UnitOfWork {
    /// Commits when `work` returns `Ok`, rolls everything back otherwise.
    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>;
}

/// Transaction scope over the connection shared by the SQLite repositories.
#[derive(Debug, Clone, Copy)]
pub struct SqliteUnitOfWork<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUnitOfWork<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        // Dropping `tx` on the error path rolls back.
        let value = work()?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

/// Accumulates `SET` clauses for a partial update.
#[derive(Debug, Default)]
pub(crate) struct PatchStatement {
    assignments: Vec<String>,
    values: Vec<Value>,
}

impl PatchStatement {
    pub(crate) fn set(&mut self, column: &'static str, value: Value) {
        self.assignments.push(format!("{column} = ?"));
        self.values.push(value);
    }

    pub(crate) fn set_expr(&mut self, assignment: &'static str) {
        self.assignments.push(assignment.to_string());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Executes against rows matching every `(column, key)` pair and returns
    /// the number of changed rows.
    pub(crate) fn execute(
        mut self,
        conn: &Connection,
        table: &'static str,
        keys: &[(&'static str, Uuid)],
    ) -> RepoResult<usize> {
        self.assignments
            .push("updated_at = (strftime('%s', 'now') * 1000)".to_string());
        let mut sql = format!("UPDATE {table} SET {}", self.assignments.join(", "));
        for (index, (column, key)) in keys.iter().enumerate() {
            sql.push_str(if index == 0 { " WHERE " } else { " AND " });
            sql.push_str(column);
            sql.push_str(" = ?");
            self.values.push(Value::Text(key.to_string()));
        }
        sql.push(';');
        Ok(conn.execute(&sql, params_from_iter(self.values))?)
    }
}

pub(crate) fn ensure_schema_ready(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_flag(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
