//! Task record.

use crate::model::{AccountId, ListId, TaskId};
use serde::{Deserialize, Serialize};

/// One card inside a task list.
///
/// `position` uses a floating-point domain: tasks are reordered far more
/// often than lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub list_id: ListId,
    pub is_finished: bool,
    /// Order key among non-archived tasks of the same list.
    pub position: f64,
    pub title: String,
    pub description: Option<String>,
    /// Optional due day, epoch ms.
    pub date: Option<i64>,
    pub creator_id: AccountId,
    /// Terminal soft-archive flag.
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
    /// Epoch ms of completion; `None` while unfinished.
    pub finished_at: Option<i64>,
}

impl Task {
    /// Returns whether this task still takes part in sibling ordering.
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }
}
