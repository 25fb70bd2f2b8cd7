//! Task use-case service.
//!
//! # Responsibility
//! - Create, rename, move, edit, finish and archive tasks.
//! - Allocate floating-point positions within a list.
//!
//! # Invariants
//! - Active tasks of a list have strictly increasing positions after every
//!   operation.
//! - A task is only mutable while it and its list are active and the list's
//!   board is writable for the acting account.

use crate::config::FieldLimits;
use crate::model::board::BoardView;
use crate::model::task::Task;
use crate::model::task_list::TaskList;
use crate::model::{AccountId, ListId, TaskId};
use crate::position::{PositionAllocator, Slot};
use crate::repo::board_view_cache::BoardViewLookup;
use crate::repo::task_list_repo::TaskListRepository;
use crate::repo::task_repo::{NewTask, TaskPatch, TaskRepository};
use crate::repo::UnitOfWork;
use crate::service::error::{ServiceError, ValidationError};
use crate::service::path_resolver::{PathResolver, PathResult};
use crate::service::task_list_service::active_list;
use crate::service::{require_writable, validate_text, RenameOutcome};

/// Editable task content. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Epoch ms due date.
    pub date: Option<i64>,
}

impl TaskUpdate {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.date.is_none()
    }
}

/// Task service facade over repository implementations.
pub struct TaskService<C, L, T, U> {
    resolver: PathResolver<C, L, T>,
    tasks: T,
    uow: U,
    allocator: PositionAllocator<f64>,
    limits: FieldLimits,
}

impl<C, L, T, U> TaskService<C, L, T, U>
where
    C: BoardViewLookup,
    L: TaskListRepository,
    T: TaskRepository,
    U: UnitOfWork,
{
    pub fn new(
        resolver: PathResolver<C, L, T>,
        tasks: T,
        uow: U,
        allocator: PositionAllocator<f64>,
        limits: FieldLimits,
    ) -> Self {
        Self {
            resolver,
            tasks,
            uow,
            allocator,
            limits,
        }
    }

    /// Appends a new task at the end of `list_id`.
    pub fn create(
        &self,
        list_id: ListId,
        title: &str,
        uid: AccountId,
    ) -> Result<Task, ServiceError> {
        validate_text("title", title, self.limits.task_title_max)?;
        self.uow.in_transaction(|| {
            let path = self.resolver.path_of_list(list_id, uid)?;
            let list = active_list(path.list, list_id)?;
            require_writable(path.board_view.as_ref(), list.board_id, uid)?;

            let siblings = self.tasks.find_siblings(list_id)?;
            let position = self.allocator.append(&task_slots(&siblings));
            let task_id = self.tasks.insert(&NewTask {
                list_id,
                title: title.to_string(),
                position,
                creator_id: uid,
            })?;
            let task = self.read_back(task_id, "created")?;
            log::info!(
                "event=task_create module=service status=ok task_id={task_id} list_id={list_id} position={position}"
            );
            Ok(task)
        })
    }

    pub fn rename(
        &self,
        task_id: TaskId,
        new_title: &str,
        uid: AccountId,
    ) -> Result<RenameOutcome, ServiceError> {
        validate_text("title", new_title, self.limits.task_title_max)?;
        self.uow.in_transaction(|| {
            let path = active_path(self.resolver.path_of_task(task_id, uid)?, task_id)?;
            if path.task.title == new_title {
                log::debug!("event=task_rename module=service status=unchanged task_id={task_id}");
                return Ok(RenameOutcome::Unchanged);
            }
            path.authorize(uid)?;

            self.tasks.update_by_id(
                task_id,
                &TaskPatch {
                    title: Some(new_title.to_string()),
                    ..TaskPatch::default()
                },
            )?;
            log::info!("event=task_rename module=service status=ok task_id={task_id}");
            Ok(RenameOutcome::Renamed)
        })
    }

    /// Moves a task right after `after` in `destination`, or first when
    /// `after` is `None`, and returns its new position.
    pub fn move_task(
        &self,
        task_id: TaskId,
        destination: ListId,
        after: Option<TaskId>,
        uid: AccountId,
    ) -> Result<f64, ServiceError> {
        self.uow.in_transaction(|| {
            let path = active_path(self.resolver.path_of_task(task_id, uid)?, task_id)?;
            path.authorize(uid)?;

            let destination_path = self.resolver.path_of_list(destination, uid)?;
            let destination_list = active_list(destination_path.list, destination)?;
            require_writable(
                destination_path.board_view.as_ref(),
                destination_list.board_id,
                uid,
            )?;

            if after == Some(task_id) {
                return Err(ValidationError::SelfAfter(task_id).into());
            }

            let siblings = self.tasks.find_siblings(destination)?;
            let placement = self
                .allocator
                .insert_after(&task_slots(&siblings), after, task_id)?;

            self.tasks.update_by_id(
                task_id,
                &TaskPatch {
                    list_id: Some(destination),
                    position: Some(placement.position),
                    ..TaskPatch::default()
                },
            )?;
            for slot in &placement.renumbered {
                self.tasks
                    .update_by_id(slot.key, &TaskPatch::position(slot.position))?;
            }

            if placement.rebalanced {
                log::warn!(
                    "event=task_rebalance module=service status=ok list_id={destination} renumbered={}",
                    placement.renumbered.len()
                );
            }
            log::info!(
                "event=task_move module=service status=ok task_id={task_id} from_list={} to_list={destination} position={}",
                path.list.list_id,
                placement.position
            );
            Ok(placement.position)
        })
    }

    /// Archives a task; it leaves the sibling scope for good.
    pub fn archive(&self, task_id: TaskId, uid: AccountId) -> Result<(), ServiceError> {
        self.uow.in_transaction(|| {
            let path = active_path(self.resolver.path_of_task(task_id, uid)?, task_id)?;
            path.authorize(uid)?;

            self.tasks.update_by_id(
                task_id,
                &TaskPatch {
                    is_archived: Some(true),
                    ..TaskPatch::default()
                },
            )?;
            log::info!(
                "event=task_archive module=service status=ok task_id={task_id} list_id={}",
                path.list.list_id
            );
            Ok(())
        })
    }

    /// Edits title, description and due date; position is untouched.
    pub fn update(
        &self,
        task_id: TaskId,
        update: TaskUpdate,
        uid: AccountId,
    ) -> Result<Task, ServiceError> {
        if update.is_empty() {
            return Err(ValidationError::NoChanges.into());
        }
        if let Some(title) = &update.title {
            validate_text("title", title, self.limits.task_title_max)?;
        }
        if let Some(description) = &update.description {
            let actual = description.chars().count();
            if actual > self.limits.description_max {
                return Err(ValidationError::TooLong {
                    field: "description",
                    max: self.limits.description_max,
                    actual,
                }
                .into());
            }
        }

        self.uow.in_transaction(|| {
            let path = active_path(self.resolver.path_of_task(task_id, uid)?, task_id)?;
            path.authorize(uid)?;

            let TaskUpdate {
                title,
                description,
                date,
            } = update;
            self.tasks.update_by_id(
                task_id,
                &TaskPatch {
                    title,
                    description,
                    date,
                    ..TaskPatch::default()
                },
            )?;
            let task = self.read_back(task_id, "updated")?;
            log::info!("event=task_update module=service status=ok task_id={task_id}");
            Ok(task)
        })
    }

    /// Marks a task finished or reopens it. Setting the current state again
    /// writes nothing.
    pub fn set_finished(
        &self,
        task_id: TaskId,
        finished: bool,
        uid: AccountId,
    ) -> Result<Task, ServiceError> {
        self.uow.in_transaction(|| {
            let path = active_path(self.resolver.path_of_task(task_id, uid)?, task_id)?;
            path.authorize(uid)?;
            if path.task.is_finished == finished {
                return Ok(path.task);
            }

            self.tasks.update_by_id(
                task_id,
                &TaskPatch {
                    is_finished: Some(finished),
                    ..TaskPatch::default()
                },
            )?;
            let task = self.read_back(task_id, "finished")?;
            log::info!(
                "event=task_finish module=service status=ok task_id={task_id} finished={finished}"
            );
            Ok(task)
        })
    }

    fn read_back(&self, task_id: TaskId, action: &str) -> Result<Task, ServiceError> {
        self.tasks.find_by_id(task_id)?.ok_or_else(|| {
            ServiceError::InvariantViolation(format!(
                "{action} task {task_id} not found in read-back"
            ))
        })
    }
}

/// A task path whose task and list are both present and active.
struct ActivePath {
    task: Task,
    list: TaskList,
    board_view: Option<BoardView>,
}

impl ActivePath {
    fn authorize(&self, uid: AccountId) -> Result<(), ServiceError> {
        require_writable(self.board_view.as_ref(), self.list.board_id, uid)?;
        Ok(())
    }
}

fn active_path(path: PathResult, task_id: TaskId) -> Result<ActivePath, ValidationError> {
    let task = match path.task {
        None => return Err(ValidationError::TaskNotFound(task_id)),
        Some(task) if !task.is_active() => return Err(ValidationError::TaskArchived(task_id)),
        Some(task) => task,
    };
    let list = active_list(path.list, task.list_id)?;
    Ok(ActivePath {
        task,
        list,
        board_view: path.board_view,
    })
}

fn task_slots(tasks: &[Task]) -> Vec<Slot<TaskId, f64>> {
    tasks
        .iter()
        .map(|task| Slot::new(task.task_id, task.position))
        .collect()
}
