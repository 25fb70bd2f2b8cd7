//! Read-side assembly of a full board.
//!
//! # Invariants
//! - Any account holding a view may read, read-only viewers included.
//! - Lists and tasks appear in ascending position order; archived entities
//!   are omitted.

use crate::model::content::{BoardContent, TaskContent, TaskListContent};
use crate::model::{AccountId, BoardId, ListId};
use crate::repo::board_view_cache::BoardViewLookup;
use crate::repo::task_list_repo::TaskListRepository;
use crate::repo::task_repo::TaskRepository;
use crate::service::error::{ServiceError, ValidationError};
use crate::service::path_resolver::PathResolver;
use std::collections::HashMap;

pub struct ReadService<C, L, T> {
    resolver: PathResolver<C, L, T>,
    lists: L,
    tasks: T,
}

impl<C, L, T> ReadService<C, L, T>
where
    C: BoardViewLookup,
    L: TaskListRepository,
    T: TaskRepository,
{
    pub fn new(resolver: PathResolver<C, L, T>, lists: L, tasks: T) -> Self {
        Self {
            resolver,
            lists,
            tasks,
        }
    }

    pub fn read_board_content(
        &self,
        board_id: BoardId,
        uid: AccountId,
    ) -> Result<BoardContent, ServiceError> {
        let view = self
            .resolver
            .path_of_board(board_id, uid)?
            .board_view
            .ok_or(ValidationError::BoardNotFound(board_id))?;

        let lists = self.lists.find_siblings(board_id)?;
        let list_ids: Vec<ListId> = lists.iter().map(|list| list.list_id).collect();

        let mut tasks_by_list: HashMap<ListId, Vec<TaskContent>> = HashMap::new();
        for task in self.tasks.find_by_lists(&list_ids)? {
            tasks_by_list
                .entry(task.list_id)
                .or_default()
                .push(TaskContent::from(task));
        }

        let lists = lists
            .into_iter()
            .map(|list| {
                let tasks = tasks_by_list.remove(&list.list_id).unwrap_or_default();
                TaskListContent::new(list, tasks)
            })
            .collect();
        log::debug!(
            "event=board_read module=service status=ok board_id={board_id} uid={uid}"
        );
        Ok(BoardContent::new(view, lists))
    }
}
