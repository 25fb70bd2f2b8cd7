//! Board and per-user board view records.

use crate::model::{AccountId, BoardId};
use serde::{Deserialize, Serialize};

/// Who can discover a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardVisibility {
    Public,
    Private,
}

impl BoardVisibility {
    /// Stable storage string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Parses a storage string, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// Board aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub board_id: BoardId,
    pub name: String,
    /// Account that created the board and may share it.
    pub owner_uid: AccountId,
    pub visibility: BoardVisibility,
    pub is_deleted: bool,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

/// Projection of one board as seen by one account.
///
/// This is the only authorization signal mutations consume: no view means
/// "no access or no such board", `read_only` means "visible but immutable".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub board_id: BoardId,
    pub name: String,
    pub visibility: BoardVisibility,
    pub uid: AccountId,
    pub read_only: bool,
    pub is_favorite: bool,
    /// Epoch ms when the account gained access.
    pub added_at: i64,
    /// Epoch ms of the account's last visit.
    pub last_open: i64,
}

impl BoardView {
    /// Returns whether the viewing account may mutate board content.
    pub fn is_writable(&self) -> bool {
        !self.read_only
    }
}
