//! Task store contract and SQLite implementation.
//!
//! # Invariants
//! - `find_siblings` returns non-archived tasks of one list ordered by
//!   `position ASC, task_id ASC`.
//! - `finished_at` is stamped when a task becomes finished and cleared when
//!   it is reopened.

use crate::db::tables;
use crate::model::task::Task;
use crate::model::{AccountId, ListId, TaskId};
use crate::repo::{
    bool_to_int, ensure_schema_ready, parse_flag, parse_uuid, PatchStatement, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    task_id,
    list_id,
    is_finished,
    position,
    title,
    description,
    date,
    creator_id,
    is_archived,
    created_at,
    updated_at,
    finished_at
FROM tasks";

/// Fields required to insert a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub list_id: ListId,
    pub title: String,
    pub position: f64,
    pub creator_id: AccountId,
}

/// Partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub list_id: Option<ListId>,
    pub position: Option<f64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<i64>,
    pub is_finished: Option<bool>,
    pub is_archived: Option<bool>,
}

impl TaskPatch {
    pub fn position(position: f64) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Store contract for tasks.
pub trait TaskRepository {
    /// Non-archived tasks of `list_id`, ascending by position.
    fn find_siblings(&self, list_id: ListId) -> RepoResult<Vec<Task>>;
    /// Non-archived tasks of several lists, each list's tasks ascending by
    /// position.
    fn find_by_lists(&self, list_ids: &[ListId]) -> RepoResult<Vec<Task>>;
    /// One task by id, archived or not.
    fn find_by_id(&self, task_id: TaskId) -> RepoResult<Option<Task>>;
    /// Inserts a task and returns its generated id.
    fn insert(&self, new_task: &NewTask) -> RepoResult<TaskId>;
    /// Applies a partial update.
    fn update_by_id(&self, task_id: TaskId, patch: &TaskPatch) -> RepoResult<()>;
}

impl<R: TaskRepository + ?Sized> TaskRepository for &R {
    fn find_siblings(&self, list_id: ListId) -> RepoResult<Vec<Task>> {
        (**self).find_siblings(list_id)
    }

    fn find_by_lists(&self, list_ids: &[ListId]) -> RepoResult<Vec<Task>> {
        (**self).find_by_lists(list_ids)
    }

    fn find_by_id(&self, task_id: TaskId) -> RepoResult<Option<Task>> {
        (**self).find_by_id(task_id)
    }

    fn insert(&self, new_task: &NewTask) -> RepoResult<TaskId> {
        (**self).insert(new_task)
    }

    fn update_by_id(&self, task_id: TaskId, patch: &TaskPatch) -> RepoResult<()> {
        (**self).update_by_id(task_id, patch)
    }
}

/// SQLite-backed task store.
#[derive(Debug, Clone, Copy)]
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &[tables::TASK_LISTS, tables::TASKS])?;
        Ok(Self { conn })
    }

    fn query_tasks(&self, sql: &str, values: Vec<Value>) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn find_siblings(&self, list_id: ListId) -> RepoResult<Vec<Task>> {
        self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE list_id = ?
                   AND is_archived = 0
                 ORDER BY position ASC, task_id ASC;"
            ),
            vec![Value::Text(list_id.to_string())],
        )
    }

    fn find_by_lists(&self, list_ids: &[ListId]) -> RepoResult<Vec<Task>> {
        if list_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; list_ids.len()].join(", ");
        self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE list_id IN ({placeholders})
                   AND is_archived = 0
                 ORDER BY list_id ASC, position ASC, task_id ASC;"
            ),
            list_ids
                .iter()
                .map(|id| Value::Text(id.to_string()))
                .collect(),
        )
    }

    fn find_by_id(&self, task_id: TaskId) -> RepoResult<Option<Task>> {
        let mut tasks = self.query_tasks(
            &format!(
                "{TASK_SELECT_SQL}
                 WHERE task_id = ?;"
            ),
            vec![Value::Text(task_id.to_string())],
        )?;
        Ok(tasks.pop())
    }

    fn insert(&self, new_task: &NewTask) -> RepoResult<TaskId> {
        let task_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tasks (
                task_id,
                list_id,
                is_finished,
                position,
                title,
                creator_id,
                is_archived
            ) VALUES (?1, ?2, 0, ?3, ?4, ?5, 0);",
            params![
                task_id.to_string(),
                new_task.list_id.to_string(),
                new_task.position,
                new_task.title.as_str(),
                new_task.creator_id.to_string(),
            ],
        )?;
        Ok(task_id)
    }

    fn update_by_id(&self, task_id: TaskId, patch: &TaskPatch) -> RepoResult<()> {
        let mut statement = PatchStatement::default();
        if let Some(list_id) = patch.list_id {
            statement.set("list_id", Value::Text(list_id.to_string()));
        }
        if let Some(position) = patch.position {
            statement.set("position", Value::Real(position));
        }
        if let Some(title) = &patch.title {
            statement.set("title", Value::Text(title.clone()));
        }
        if let Some(description) = &patch.description {
            statement.set("description", Value::Text(description.clone()));
        }
        if let Some(date) = patch.date {
            statement.set("date", Value::Integer(date));
        }
        if let Some(is_finished) = patch.is_finished {
            statement.set("is_finished", Value::Integer(bool_to_int(is_finished)));
            statement.set_expr(if is_finished {
                "finished_at = (strftime('%s', 'now') * 1000)"
            } else {
                "finished_at = NULL"
            });
        }
        if let Some(is_archived) = patch.is_archived {
            statement.set("is_archived", Value::Integer(bool_to_int(is_archived)));
        }
        if statement.is_empty() {
            return Ok(());
        }

        let changed = statement.execute(self.conn, "tasks", &[("task_id", task_id)])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "task",
                id: task_id,
            });
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let task_id: String = row.get("task_id")?;
    let list_id: String = row.get("list_id")?;
    let creator_id: String = row.get("creator_id")?;

    Ok(Task {
        task_id: parse_uuid(&task_id, "tasks.task_id")?,
        list_id: parse_uuid(&list_id, "tasks.list_id")?,
        is_finished: parse_flag(row.get("is_finished")?, "tasks.is_finished")?,
        position: row.get("position")?,
        title: row.get("title")?,
        description: row.get("description")?,
        date: row.get("date")?,
        creator_id: parse_uuid(&creator_id, "tasks.creator_id")?,
        is_archived: parse_flag(row.get("is_archived")?, "tasks.is_archived")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        finished_at: row.get("finished_at")?,
    })
}
