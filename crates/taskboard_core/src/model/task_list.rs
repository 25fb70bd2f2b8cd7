//! Task list record.

use crate::model::{AccountId, BoardId, ListId};
use serde::{Deserialize, Serialize};

/// Ordered column of tasks inside one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub list_id: ListId,
    pub board_id: BoardId,
    pub name: String,
    /// Order key among non-archived lists of the same board.
    pub position: i64,
    pub created_by: AccountId,
    /// Terminal soft-archive flag.
    pub is_archived: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskList {
    /// Returns whether this list still takes part in sibling ordering.
    pub fn is_active(&self) -> bool {
        !self.is_archived
    }
}
