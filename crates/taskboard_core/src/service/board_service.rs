//! Board and ownership use-case service.
//!
//! # Responsibility
//! - Create boards together with the owner's writable ownership record.
//! - Page through an account's boards, most recently opened first.
//! - Maintain per-account favorite, last-open and sharing state.
//!
//! # Invariants
//! - Every ownership write evicts the affected `(uid, board_id)` cache key
//!   first, inside the same transaction.
//! - Only the board owner may share; the owner's own record is never
//!   altered by sharing.

use crate::config::FieldLimits;
use crate::model::board::{BoardView, BoardVisibility};
use crate::model::{AccountId, BoardId};
use crate::repo::board_repo::{
    normalize_board_limit, BoardRepository, BoardViewQuery, NewBoard, NewOwnership,
    OwnershipPatch,
};
use crate::repo::board_view_cache::BoardViewLookup;
use crate::repo::UnitOfWork;
use crate::service::error::{ServiceError, ValidationError};
use crate::service::{epoch_millis, validate_text};

/// Paging request for [`BoardService::list_boards`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardListQuery {
    /// Case-insensitive board name prefix.
    pub start_with: Option<String>,
    /// Defaults to 10, clamped to 50.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// List result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardListResult {
    /// Views sorted by `last_open DESC, board_id ASC`.
    pub items: Vec<BoardView>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

pub struct BoardService<B, C, U> {
    boards: B,
    views: C,
    uow: U,
    limits: FieldLimits,
}

impl<B, C, U> BoardService<B, C, U>
where
    B: BoardRepository,
    C: BoardViewLookup,
    U: UnitOfWork,
{
    pub fn new(boards: B, views: C, uow: U, limits: FieldLimits) -> Self {
        Self {
            boards,
            views,
            uow,
            limits,
        }
    }

    /// Creates a board owned by `owner` and returns the owner's view.
    pub fn create_board(
        &self,
        name: &str,
        visibility: BoardVisibility,
        owner: AccountId,
    ) -> Result<BoardView, ServiceError> {
        validate_text("name", name, self.limits.board_name_max)?;
        self.uow.in_transaction(|| {
            let board_id = self.boards.insert_board(&NewBoard {
                name: name.to_string(),
                owner_uid: owner,
                visibility,
            })?;
            self.boards.insert_ownership(&NewOwnership {
                board_id,
                uid: owner,
                read_only: false,
            })?;
            let view = self.boards.find_board_view(owner, board_id)?.ok_or_else(|| {
                ServiceError::InvariantViolation(format!(
                    "created board {board_id} has no owner view in read-back"
                ))
            })?;
            log::info!(
                "event=board_create module=service status=ok board_id={board_id} uid={owner} visibility={}",
                visibility.as_str()
            );
            Ok(view)
        })
    }

    pub fn list_boards(
        &self,
        uid: AccountId,
        query: &BoardListQuery,
    ) -> Result<BoardListResult, ServiceError> {
        let applied_limit = normalize_board_limit(query.limit);
        let items = self.boards.search_board_views(
            uid,
            &BoardViewQuery {
                start_with: query.start_with.clone(),
                limit: applied_limit,
                offset: query.offset,
            },
        )?;
        Ok(BoardListResult {
            items,
            applied_limit,
        })
    }

    /// Stars or unstars a board for `uid`. Read-only viewers may do this too.
    pub fn set_favorite(
        &self,
        board_id: BoardId,
        uid: AccountId,
        favorite: bool,
    ) -> Result<(), ServiceError> {
        self.update_own_record(
            board_id,
            uid,
            OwnershipPatch {
                is_favorite: Some(favorite),
                ..OwnershipPatch::default()
            },
        )?;
        log::info!(
            "event=board_favorite module=service status=ok board_id={board_id} uid={uid} favorite={favorite}"
        );
        Ok(())
    }

    /// Stamps the board as just opened by `uid` and returns the fresh view.
    pub fn open_board(&self, board_id: BoardId, uid: AccountId) -> Result<BoardView, ServiceError> {
        self.update_own_record(
            board_id,
            uid,
            OwnershipPatch {
                last_open: Some(epoch_millis()),
                ..OwnershipPatch::default()
            },
        )?;
        self.views
            .find(uid, board_id)?
            .ok_or(ServiceError::Validation(ValidationError::BoardNotFound(
                board_id,
            )))
    }

    /// Grants `target` access to a board owned by `owner`, or changes the
    /// access it already has.
    pub fn share_board(
        &self,
        board_id: BoardId,
        owner: AccountId,
        target: AccountId,
        read_only: bool,
    ) -> Result<BoardView, ServiceError> {
        self.uow.in_transaction(|| {
            let board = self
                .boards
                .find_board(board_id)?
                .filter(|board| !board.is_deleted)
                .ok_or(ValidationError::BoardNotFound(board_id))?;
            if board.owner_uid != owner {
                log::info!(
                    "event=board_share module=service status=rejected board_id={board_id} uid={owner} reason=not_owner"
                );
                return Err(ServiceError::Unauthorized {
                    board_id,
                    uid: owner,
                });
            }
            if target == board.owner_uid {
                return Err(ValidationError::OwnerAccessImmutable(board_id).into());
            }

            self.views.evict(target, board_id);
            if self.boards.find_board_view(target, board_id)?.is_some() {
                self.boards.update_ownership(
                    board_id,
                    target,
                    &OwnershipPatch {
                        read_only: Some(read_only),
                        ..OwnershipPatch::default()
                    },
                )?;
            } else {
                self.boards.insert_ownership(&NewOwnership {
                    board_id,
                    uid: target,
                    read_only,
                })?;
            }

            let view = self.boards.find_board_view(target, board_id)?.ok_or_else(|| {
                ServiceError::InvariantViolation(format!(
                    "shared board {board_id} has no view for {target} in read-back"
                ))
            })?;
            log::info!(
                "event=board_share module=service status=ok board_id={board_id} target={target} read_only={read_only}"
            );
            Ok(view)
        })
    }

    fn update_own_record(
        &self,
        board_id: BoardId,
        uid: AccountId,
        patch: OwnershipPatch,
    ) -> Result<(), ServiceError> {
        self.uow.in_transaction(|| {
            if self.boards.find_board_view(uid, board_id)?.is_none() {
                return Err(ValidationError::BoardNotFound(board_id).into());
            }
            self.views.evict(uid, board_id);
            self.boards.update_ownership(board_id, uid, &patch)?;
            Ok(())
        })
    }
}
