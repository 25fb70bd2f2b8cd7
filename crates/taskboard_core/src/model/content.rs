//! Read-side projections of a full board.

use crate::model::board::{BoardView, BoardVisibility};
use crate::model::task::Task;
use crate::model::task_list::TaskList;
use crate::model::{AccountId, BoardId, ListId, TaskId};
use serde::Serialize;

/// Board with its lists and tasks in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardContent {
    pub board_id: BoardId,
    pub uid: AccountId,
    pub name: String,
    pub visibility: BoardVisibility,
    pub read_only: bool,
    pub is_favorite: bool,
    /// Sorted ascending by position.
    pub lists: Vec<TaskListContent>,
}

impl BoardContent {
    pub fn new(view: BoardView, lists: Vec<TaskListContent>) -> Self {
        Self {
            board_id: view.board_id,
            uid: view.uid,
            name: view.name,
            visibility: view.visibility,
            read_only: view.read_only,
            is_favorite: view.is_favorite,
            lists,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskListContent {
    pub list_id: ListId,
    pub board_id: BoardId,
    pub name: String,
    pub position: i64,
    /// Sorted ascending by position.
    pub tasks: Vec<TaskContent>,
}

impl TaskListContent {
    pub fn new(list: TaskList, tasks: Vec<TaskContent>) -> Self {
        Self {
            list_id: list.list_id,
            board_id: list.board_id,
            name: list.name,
            position: list.position,
            tasks,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskContent {
    pub task_id: TaskId,
    pub list_id: ListId,
    pub is_finished: bool,
    pub position: f64,
    pub title: String,
    pub description: Option<String>,
    pub date: Option<i64>,
}

impl From<Task> for TaskContent {
    fn from(task: Task) -> Self {
        Self {
            task_id: task.task_id,
            list_id: task.list_id,
            is_finished: task.is_finished,
            position: task.position,
            title: task.title,
            description: task.description,
            date: task.date,
        }
    }
}
