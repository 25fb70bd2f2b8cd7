//! Typed failures surfaced by board services.

use crate::model::{AccountId, BoardId, ListId, TaskId};
use crate::position::PlacementError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Malformed input, including references to missing or archived entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty or whitespace only.
    BlankField { field: &'static str },
    /// Field exceeds its configured maximum length in characters.
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },
    /// Move anchor is the moving entity itself.
    SelfAfter(Uuid),
    /// Move anchor is not an active sibling in the destination.
    AnchorNotFound(Uuid),
    BoardNotFound(BoardId),
    ListNotFound(ListId),
    ListArchived(ListId),
    TaskNotFound(TaskId),
    TaskArchived(TaskId),
    /// Update request carries no field to change.
    NoChanges,
    /// The owner's own ownership record cannot be changed by sharing.
    OwnerAccessImmutable(BoardId),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField { field } => write!(f, "{field} must not be blank"),
            Self::TooLong { field, max, actual } => {
                write!(f, "{field} is too long: {actual} characters, max {max}")
            }
            Self::SelfAfter(id) => write!(f, "cannot place {id} after itself"),
            Self::AnchorNotFound(id) => write!(f, "anchor {id} is not in the destination"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ListNotFound(id) => write!(f, "task list not found: {id}"),
            Self::ListArchived(id) => write!(f, "task list is archived: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::TaskArchived(id) => write!(f, "task is archived: {id}"),
            Self::NoChanges => write!(f, "update contains no changes"),
            Self::OwnerAccessImmutable(id) => {
                write!(f, "owner access to board {id} cannot be changed")
            }
        }
    }
}

impl Error for ValidationError {}

impl From<PlacementError<Uuid>> for ValidationError {
    fn from(value: PlacementError<Uuid>) -> Self {
        match value {
            PlacementError::SelfAfter(id) => Self::SelfAfter(id),
            PlacementError::UnknownAnchor(id) => Self::AnchorNotFound(id),
        }
    }
}

/// Service error for board, list and task use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    /// The acting account has no writable view of the board.
    Unauthorized { board_id: BoardId, uid: AccountId },
    /// A row expected right after a write could not be read back.
    InvariantViolation(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Unauthorized { board_id, uid } => {
                write!(f, "account {uid} may not modify board {board_id}")
            }
            Self::InvariantViolation(details) => write!(f, "invariant violated: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PlacementError<Uuid>> for ServiceError {
    fn from(value: PlacementError<Uuid>) -> Self {
        Self::Validation(value.into())
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl ServiceError {
    /// Returns the validation failure, if this is one.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ServiceError, ValidationError};
    use crate::position::PlacementError;
    use uuid::Uuid;

    #[test]
    fn placement_errors_become_validation_errors() {
        let id = Uuid::new_v4();
        let err = ServiceError::from(PlacementError::UnknownAnchor(id));
        assert_eq!(err.validation(), Some(&ValidationError::AnchorNotFound(id)));

        let err = ServiceError::from(PlacementError::SelfAfter(id));
        assert_eq!(err.validation(), Some(&ValidationError::SelfAfter(id)));
    }

    #[test]
    fn too_long_message_names_field_and_limit() {
        let err = ValidationError::TooLong {
            field: "title",
            max: 128,
            actual: 129,
        };
        assert_eq!(err.to_string(), "title is too long: 129 characters, max 128");
    }
}
