//! Core use-case services.
//!
//! # Responsibility
//! - Resolve and authorize the board/list/task path of every request.
//! - Orchestrate repository calls and position allocation into
//!   transactional use-case APIs.
//!
//! # Invariants
//! - Every mutation runs inside one `UnitOfWork` transaction.
//! - Writes require a present, non read-only board view and no archived
//!   list or task on the path.

pub mod board_service;
pub mod error;
pub mod path_resolver;
pub mod read_service;
pub mod task_list_service;
pub mod task_service;

use crate::model::board::BoardView;
use crate::model::{AccountId, BoardId};
use crate::service::error::{ServiceError, ValidationError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Result of a rename request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// The new name was persisted.
    Renamed,
    /// The name already matched; nothing was written.
    Unchanged,
}

/// Checks that text is non-blank and at most `max` characters.
pub(crate) fn validate_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField { field });
    }
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Returns the view when `uid` may write to `board_id`.
pub(crate) fn require_writable(
    view: Option<&BoardView>,
    board_id: BoardId,
    uid: AccountId,
) -> Result<&BoardView, ServiceError> {
    match view {
        Some(view) if view.is_writable() => Ok(view),
        other => {
            log::info!(
                "event=authorize module=service status=rejected board_id={board_id} uid={uid} reason={}",
                if other.is_some() { "read_only" } else { "no_view" }
            );
            Err(ServiceError::Unauthorized { board_id, uid })
        }
    }
}

pub(crate) fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
