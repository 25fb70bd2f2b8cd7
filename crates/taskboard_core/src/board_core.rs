//! Composition root wiring one connection into services.
//!
//! # Responsibility
//! - Build repositories, the board view cache and the position allocators
//!   from one migrated connection and one validated configuration.
//! - Hand out services borrowing that wiring.
//!
//! # Invariants
//! - All services of one `BoardCore` share the same cache instance.
//! - Repositories and the unit of work share the same connection, so every
//!   repository call of a service runs inside its transaction.

use crate::config::{ConfigError, CoreConfig};
use crate::repo::board_repo::SqliteBoardRepository;
use crate::repo::board_view_cache::BoardViewCache;
use crate::repo::task_list_repo::SqliteTaskListRepository;
use crate::repo::task_repo::SqliteTaskRepository;
use crate::repo::{RepoError, SqliteUnitOfWork};
use crate::service::board_service::BoardService;
use crate::service::path_resolver::PathResolver;
use crate::service::read_service::ReadService;
use crate::service::task_list_service::TaskListService;
use crate::service::task_service::TaskService;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

type ViewCache<'conn> = BoardViewCache<SqliteBoardRepository<'conn>>;

pub type SqlitePathResolver<'a, 'conn> =
    PathResolver<&'a ViewCache<'conn>, SqliteTaskListRepository<'conn>, SqliteTaskRepository<'conn>>;
pub type SqliteTaskListService<'a, 'conn> = TaskListService<
    &'a ViewCache<'conn>,
    SqliteTaskListRepository<'conn>,
    SqliteTaskRepository<'conn>,
    SqliteUnitOfWork<'conn>,
>;
pub type SqliteTaskService<'a, 'conn> = TaskService<
    &'a ViewCache<'conn>,
    SqliteTaskListRepository<'conn>,
    SqliteTaskRepository<'conn>,
    SqliteUnitOfWork<'conn>,
>;
pub type SqliteBoardService<'a, 'conn> =
    BoardService<SqliteBoardRepository<'conn>, &'a ViewCache<'conn>, SqliteUnitOfWork<'conn>>;
pub type SqliteReadService<'a, 'conn> =
    ReadService<&'a ViewCache<'conn>, SqliteTaskListRepository<'conn>, SqliteTaskRepository<'conn>>;

/// Bootstrap failure of [`BoardCore`].
#[derive(Debug)]
pub enum CoreInitError {
    Config(ConfigError),
    Repo(RepoError),
}

impl Display for CoreInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CoreInitError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for CoreInitError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Board core bound to one SQLite connection.
pub struct BoardCore<'conn> {
    config: CoreConfig,
    boards: SqliteBoardRepository<'conn>,
    lists: SqliteTaskListRepository<'conn>,
    tasks: SqliteTaskRepository<'conn>,
    uow: SqliteUnitOfWork<'conn>,
    views: ViewCache<'conn>,
}

impl<'conn> BoardCore<'conn> {
    /// Validates `config` and wires repositories over a migrated connection.
    pub fn try_new(conn: &'conn Connection, config: CoreConfig) -> Result<Self, CoreInitError> {
        config.validate()?;
        let boards = SqliteBoardRepository::try_new(conn)?;
        let lists = SqliteTaskListRepository::try_new(conn)?;
        let tasks = SqliteTaskRepository::try_new(conn)?;
        let views = BoardViewCache::new(boards, &config.cache);
        log::info!(
            "event=core_init module=core status=ok list_interval={} task_interval={} cache_entries={}",
            config.positions.list_interval,
            config.positions.task_interval,
            config.cache.board_view_max_entries
        );
        Ok(Self {
            boards,
            lists,
            tasks,
            uow: SqliteUnitOfWork::new(conn),
            views,
            config,
        })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn view_cache(&self) -> &ViewCache<'conn> {
        &self.views
    }

    pub fn resolver(&self) -> SqlitePathResolver<'_, 'conn> {
        PathResolver::new(&self.views, self.lists, self.tasks)
    }

    pub fn lists(&self) -> SqliteTaskListService<'_, 'conn> {
        TaskListService::new(
            self.resolver(),
            self.lists,
            self.uow,
            self.config.positions.list_allocator(),
            self.config.limits.clone(),
        )
    }

    pub fn tasks(&self) -> SqliteTaskService<'_, 'conn> {
        TaskService::new(
            self.resolver(),
            self.tasks,
            self.uow,
            self.config.positions.task_allocator(),
            self.config.limits.clone(),
        )
    }

    pub fn boards(&self) -> SqliteBoardService<'_, 'conn> {
        BoardService::new(
            self.boards,
            &self.views,
            self.uow,
            self.config.limits.clone(),
        )
    }

    pub fn reader(&self) -> SqliteReadService<'_, 'conn> {
        ReadService::new(self.resolver(), self.lists, self.tasks)
    }
}
