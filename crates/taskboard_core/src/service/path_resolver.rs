//! Ancestor chain lookup for boards, lists and tasks.
//!
//! # Responsibility
//! - Resolve `task -> list -> board view` in one call per leaf kind.
//! - Report every level independently; absence is never an error.
//!
//! # Invariants
//! - Resolution short-circuits upward: once a level is missing, every
//!   ancestor above it is reported as `None` without being looked up.
//! - Board views come from the [`BoardViewLookup`] only.
//! - Archived lists and tasks are returned as-is; callers decide.

use crate::model::board::BoardView;
use crate::model::task::Task;
use crate::model::task_list::TaskList;
use crate::model::{AccountId, BoardId, ListId, TaskId};
use crate::repo::board_view_cache::BoardViewLookup;
use crate::repo::task_list_repo::TaskListRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoResult;

/// Resolved path; each level is independently optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathResult {
    pub board_view: Option<BoardView>,
    pub list: Option<TaskList>,
    pub task: Option<Task>,
}

pub struct PathResolver<C, L, T> {
    views: C,
    lists: L,
    tasks: T,
}

impl<C, L, T> PathResolver<C, L, T>
where
    C: BoardViewLookup,
    L: TaskListRepository,
    T: TaskRepository,
{
    pub fn new(views: C, lists: L, tasks: T) -> Self {
        Self {
            views,
            lists,
            tasks,
        }
    }

    pub fn path_of_board(&self, board_id: BoardId, uid: AccountId) -> RepoResult<PathResult> {
        Ok(PathResult {
            board_view: self.views.find(uid, board_id)?,
            ..PathResult::default()
        })
    }

    pub fn path_of_list(&self, list_id: ListId, uid: AccountId) -> RepoResult<PathResult> {
        let Some(list) = self.lists.find_by_id(list_id)? else {
            return Ok(PathResult::default());
        };
        Ok(PathResult {
            board_view: self.views.find(uid, list.board_id)?,
            list: Some(list),
            task: None,
        })
    }

    pub fn path_of_task(&self, task_id: TaskId, uid: AccountId) -> RepoResult<PathResult> {
        let Some(task) = self.tasks.find_by_id(task_id)? else {
            return Ok(PathResult::default());
        };
        let Some(list) = self.lists.find_by_id(task.list_id)? else {
            return Ok(PathResult {
                task: Some(task),
                ..PathResult::default()
            });
        };
        Ok(PathResult {
            board_view: self.views.find(uid, list.board_id)?,
            list: Some(list),
            task: Some(task),
        })
    }
}
