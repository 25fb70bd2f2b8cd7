//! Task list use-case service.
//!
//! # Responsibility
//! - Create, rename, move and archive task lists within and across boards.
//! - Allocate integer positions and persist renumbered siblings.
//!
//! # Invariants
//! - Active lists of a board have strictly increasing positions after every
//!   operation.
//! - A move authorizes both the current and the destination board, even
//!   when they are the same board.
//! - Renaming to the current name writes nothing.

use crate::config::FieldLimits;
use crate::model::task_list::TaskList;
use crate::model::{AccountId, BoardId, ListId};
use crate::position::{PositionAllocator, Slot};
use crate::repo::board_view_cache::BoardViewLookup;
use crate::repo::task_list_repo::{NewTaskList, TaskListPatch, TaskListRepository};
use crate::repo::task_repo::TaskRepository;
use crate::repo::UnitOfWork;
use crate::service::error::{ServiceError, ValidationError};
use crate::service::path_resolver::PathResolver;
use crate::service::{require_writable, validate_text, RenameOutcome};

/// Task list service facade over repository implementations.
pub struct TaskListService<C, L, T, U> {
    resolver: PathResolver<C, L, T>,
    lists: L,
    uow: U,
    allocator: PositionAllocator<i64>,
    limits: FieldLimits,
}

impl<C, L, T, U> TaskListService<C, L, T, U>
where
    C: BoardViewLookup,
    L: TaskListRepository,
    T: TaskRepository,
    U: UnitOfWork,
{
    pub fn new(
        resolver: PathResolver<C, L, T>,
        lists: L,
        uow: U,
        allocator: PositionAllocator<i64>,
        limits: FieldLimits,
    ) -> Self {
        Self {
            resolver,
            lists,
            uow,
            allocator,
            limits,
        }
    }

    /// Appends a new list at the end of `board_id`.
    pub fn create(
        &self,
        board_id: BoardId,
        name: &str,
        uid: AccountId,
    ) -> Result<TaskList, ServiceError> {
        validate_text("name", name, self.limits.list_name_max)?;
        self.uow.in_transaction(|| {
            let path = self.resolver.path_of_board(board_id, uid)?;
            require_writable(path.board_view.as_ref(), board_id, uid)?;

            let siblings = self.lists.find_siblings(board_id)?;
            let position = self.allocator.append(&list_slots(&siblings));
            let list_id = self.lists.insert(&NewTaskList {
                board_id,
                name: name.to_string(),
                position,
                created_by: uid,
            })?;
            let list = self.lists.find_by_id(list_id)?.ok_or_else(|| {
                ServiceError::InvariantViolation(format!(
                    "created task list {list_id} not found in read-back"
                ))
            })?;
            log::info!(
                "event=task_list_create module=service status=ok list_id={list_id} board_id={board_id} position={position}"
            );
            Ok(list)
        })
    }

    pub fn rename(
        &self,
        list_id: ListId,
        new_name: &str,
        uid: AccountId,
    ) -> Result<RenameOutcome, ServiceError> {
        validate_text("name", new_name, self.limits.list_name_max)?;
        self.uow.in_transaction(|| {
            let path = self.resolver.path_of_list(list_id, uid)?;
            let list = active_list(path.list, list_id)?;
            if list.name == new_name {
                log::debug!(
                    "event=task_list_rename module=service status=unchanged list_id={list_id}"
                );
                return Ok(RenameOutcome::Unchanged);
            }
            require_writable(path.board_view.as_ref(), list.board_id, uid)?;

            self.lists.update_by_id(
                list_id,
                &TaskListPatch {
                    name: Some(new_name.to_string()),
                    ..TaskListPatch::default()
                },
            )?;
            log::info!("event=task_list_rename module=service status=ok list_id={list_id}");
            Ok(RenameOutcome::Renamed)
        })
    }

    /// Moves a list right after `after` in `destination`, or first when
    /// `after` is `None`, and returns its new position.
    pub fn move_list(
        &self,
        list_id: ListId,
        destination: BoardId,
        after: Option<ListId>,
        uid: AccountId,
    ) -> Result<i64, ServiceError> {
        self.uow.in_transaction(|| {
            let path = self.resolver.path_of_list(list_id, uid)?;
            let list = active_list(path.list, list_id)?;
            require_writable(path.board_view.as_ref(), list.board_id, uid)?;

            let destination_path = self.resolver.path_of_board(destination, uid)?;
            require_writable(destination_path.board_view.as_ref(), destination, uid)?;

            if after == Some(list_id) {
                return Err(ValidationError::SelfAfter(list_id).into());
            }

            let siblings = self.lists.find_siblings(destination)?;
            let placement = self
                .allocator
                .insert_after(&list_slots(&siblings), after, list_id)?;

            self.lists.update_by_id(
                list_id,
                &TaskListPatch {
                    board_id: Some(destination),
                    position: Some(placement.position),
                    ..TaskListPatch::default()
                },
            )?;
            for slot in &placement.renumbered {
                self.lists
                    .update_by_id(slot.key, &TaskListPatch::position(slot.position))?;
            }

            if placement.rebalanced {
                log::warn!(
                    "event=task_list_rebalance module=service status=ok board_id={destination} renumbered={}",
                    placement.renumbered.len()
                );
            }
            log::info!(
                "event=task_list_move module=service status=ok list_id={list_id} from_board={} to_board={destination} position={}",
                list.board_id,
                placement.position
            );
            Ok(placement.position)
        })
    }

    /// Archives a list; it leaves the sibling scope for good.
    pub fn archive(&self, list_id: ListId, uid: AccountId) -> Result<(), ServiceError> {
        self.uow.in_transaction(|| {
            let path = self.resolver.path_of_list(list_id, uid)?;
            let list = active_list(path.list, list_id)?;
            require_writable(path.board_view.as_ref(), list.board_id, uid)?;

            self.lists.update_by_id(
                list_id,
                &TaskListPatch {
                    is_archived: Some(true),
                    ..TaskListPatch::default()
                },
            )?;
            log::info!(
                "event=task_list_archive module=service status=ok list_id={list_id} board_id={}",
                list.board_id
            );
            Ok(())
        })
    }
}

/// Requires a resolved, non-archived list.
pub(crate) fn active_list(
    list: Option<TaskList>,
    list_id: ListId,
) -> Result<TaskList, ValidationError> {
    match list {
        None => Err(ValidationError::ListNotFound(list_id)),
        Some(list) if !list.is_active() => Err(ValidationError::ListArchived(list_id)),
        Some(list) => Ok(list),
    }
}

fn list_slots(lists: &[TaskList]) -> Vec<Slot<ListId, i64>> {
    lists
        .iter()
        .map(|list| Slot::new(list.list_id, list.position))
        .collect()
}
