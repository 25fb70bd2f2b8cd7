//! Task list store contract and SQLite implementation.
//!
//! # Invariants
//! - `find_siblings` returns non-archived lists of one board ordered by
//!   `position ASC, list_id ASC`.
//! - `find_by_id` returns archived lists as well.

use crate::db::tables;
use crate::model::task_list::TaskList;
use crate::model::{AccountId, BoardId, ListId};
use crate::repo::{
    bool_to_int, ensure_schema_ready, parse_flag, parse_uuid, PatchStatement, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TASK_LIST_SELECT_SQL: &str = "SELECT
    list_id,
    board_id,
    name,
    position,
    created_by,
    is_archived,
    created_at,
    updated_at
FROM task_lists";

/// Fields required to insert a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskList {
    pub board_id: BoardId,
    pub name: String,
    pub position: i64,
    pub created_by: AccountId,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListPatch {
    pub board_id: Option<BoardId>,
    pub name: Option<String>,
    pub position: Option<i64>,
    pub is_archived: Option<bool>,
}

impl TaskListPatch {
    pub fn position(position: i64) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Store contract for task lists.
pub trait TaskListRepository {
    /// Non-archived lists of `board_id`, ascending by position.
    fn find_siblings(&self, board_id: BoardId) -> RepoResult<Vec<TaskList>>;
    /// One list by id, archived or not.
    fn find_by_id(&self, list_id: ListId) -> RepoResult<Option<TaskList>>;
    /// Inserts a list and returns its generated id.
    fn insert(&self, new_list: &NewTaskList) -> RepoResult<ListId>;
    /// Applies a partial update.
    fn update_by_id(&self, list_id: ListId, patch: &TaskListPatch) -> RepoResult<()>;
}

impl<R: TaskListRepository + ?Sized> TaskListRepository for &R {
    fn find_siblings(&self, board_id: BoardId) -> RepoResult<Vec<TaskList>> {
        (**self).find_siblings(board_id)
    }

    fn find_by_id(&self, list_id: ListId) -> RepoResult<Option<TaskList>> {
        (**self).find_by_id(list_id)
    }

    fn insert(&self, new_list: &NewTaskList) -> RepoResult<ListId> {
        (**self).insert(new_list)
    }

    fn update_by_id(&self, list_id: ListId, patch: &TaskListPatch) -> RepoResult<()> {
        (**self).update_by_id(list_id, patch)
    }
}

/// SQLite-backed task list store.
#[derive(Debug, Clone, Copy)]
pub struct SqliteTaskListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskListRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &[tables::BOARDS, tables::TASK_LISTS])?;
        Ok(Self { conn })
    }
}

impl TaskListRepository for SqliteTaskListRepository<'_> {
    fn find_siblings(&self, board_id: BoardId) -> RepoResult<Vec<TaskList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_LIST_SELECT_SQL}
             WHERE board_id = ?1
               AND is_archived = 0
             ORDER BY position ASC, list_id ASC;"
        ))?;
        let mut rows = stmt.query([board_id.to_string()])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_task_list_row(row)?);
        }
        Ok(lists)
    }

    fn find_by_id(&self, list_id: ListId) -> RepoResult<Option<TaskList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_LIST_SELECT_SQL}
             WHERE list_id = ?1;"
        ))?;
        let mut rows = stmt.query([list_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_task_list_row(row)?));
        }
        Ok(None)
    }

    fn insert(&self, new_list: &NewTaskList) -> RepoResult<ListId> {
        let list_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO task_lists (
                list_id,
                board_id,
                name,
                position,
                created_by,
                is_archived
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                list_id.to_string(),
                new_list.board_id.to_string(),
                new_list.name.as_str(),
                new_list.position,
                new_list.created_by.to_string(),
            ],
        )?;
        Ok(list_id)
    }

    fn update_by_id(&self, list_id: ListId, patch: &TaskListPatch) -> RepoResult<()> {
        let mut statement = PatchStatement::default();
        if let Some(board_id) = patch.board_id {
            statement.set("board_id", Value::Text(board_id.to_string()));
        }
        if let Some(name) = &patch.name {
            statement.set("name", Value::Text(name.clone()));
        }
        if let Some(position) = patch.position {
            statement.set("position", Value::Integer(position));
        }
        if let Some(is_archived) = patch.is_archived {
            statement.set("is_archived", Value::Integer(bool_to_int(is_archived)));
        }
        if statement.is_empty() {
            return Ok(());
        }

        let changed = statement.execute(self.conn, "task_lists", &[("list_id", list_id)])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task list",
                id: list_id,
            });
        }
        Ok(())
    }
}

fn parse_task_list_row(row: &Row<'_>) -> RepoResult<TaskList> {
    let list_id: String = row.get("list_id")?;
    let board_id: String = row.get("board_id")?;
    let created_by: String = row.get("created_by")?;

    Ok(TaskList {
        list_id: parse_uuid(&list_id, "task_lists.list_id")?,
        board_id: parse_uuid(&board_id, "task_lists.board_id")?,
        name: row.get("name")?,
        position: row.get("position")?,
        created_by: parse_uuid(&created_by, "task_lists.created_by")?,
        is_archived: parse_flag(row.get("is_archived")?, "task_lists.is_archived")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
