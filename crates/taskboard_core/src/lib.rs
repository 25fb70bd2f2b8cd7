//! Core domain logic for the task board.
//! This crate is the single source of truth for ordering and authorization
//! invariants of boards, task lists and tasks.

pub mod board_core;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod position;
pub mod repo;
pub mod service;

pub use board_core::{BoardCore, CoreInitError};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::board::{Board, BoardView, BoardVisibility};
pub use model::content::{BoardContent, TaskContent, TaskListContent};
pub use model::task::Task;
pub use model::task_list::TaskList;
pub use model::{AccountId, BoardId, ListId, TaskId};
pub use position::{Placement, PlacementError, PositionAllocator, Slot};
pub use repo::{RepoError, RepoResult, UnitOfWork};
pub use service::error::{ServiceError, ValidationError};
pub use service::path_resolver::{PathResolver, PathResult};
pub use service::RenameOutcome;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
