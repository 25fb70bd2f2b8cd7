//! Board and board ownership store.
//!
//! # Responsibility
//! - Persist boards and per-account ownership records.
//! - Project `(board, ownership)` pairs into `BoardView` rows.
//!
//! # Invariants
//! - Deleted boards never produce a view.
//! - View searches are ordered by `last_open DESC, board_id ASC`.

use crate::db::tables;
use crate::model::board::{Board, BoardView, BoardVisibility};
use crate::model::{AccountId, BoardId};
use crate::repo::{
    bool_to_int, ensure_schema_ready, parse_flag, parse_uuid, PatchStatement, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const BOARD_VIEW_SELECT_SQL: &str = "SELECT
    b.board_id,
    b.name,
    b.visibility,
    o.uid,
    o.read_only,
    o.is_favorite,
    o.added_at,
    o.last_open
FROM board_ownerships o
JOIN boards b ON b.board_id = o.board_id";

const BOARD_VIEWS_DEFAULT_LIMIT: u32 = 10;
const BOARD_VIEWS_LIMIT_MAX: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoard {
    pub name: String,
    pub owner_uid: AccountId,
    pub visibility: BoardVisibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOwnership {
    pub board_id: BoardId,
    pub uid: AccountId,
    pub read_only: bool,
}

/// Partial update of one ownership record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OwnershipPatch {
    pub read_only: Option<bool>,
    pub is_favorite: Option<bool>,
    /// Epoch ms of the last visit.
    pub last_open: Option<i64>,
}

/// Paging window over one account's board views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardViewQuery {
    /// Case-insensitive name prefix.
    pub start_with: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

/// Store contract for boards and their ownership records.
pub trait BoardRepository {
    fn insert_board(&self, new_board: &NewBoard) -> RepoResult<BoardId>;
    fn find_board(&self, board_id: BoardId) -> RepoResult<Option<Board>>;
    fn insert_ownership(&self, ownership: &NewOwnership) -> RepoResult<()>;
    fn update_ownership(
        &self,
        board_id: BoardId,
        uid: AccountId,
        patch: &OwnershipPatch,
    ) -> RepoResult<()>;
    /// The board as seen by `uid`, if the account holds an ownership record.
    fn find_board_view(&self, uid: AccountId, board_id: BoardId) -> RepoResult<Option<BoardView>>;
    fn search_board_views(
        &self,
        uid: AccountId,
        query: &BoardViewQuery,
    ) -> RepoResult<Vec<BoardView>>;
}

impl<R: BoardRepository + ?Sized> BoardRepository for &R {
    fn insert_board(&self, new_board: &NewBoard) -> RepoResult<BoardId> {
        (**self).insert_board(new_board)
    }

    fn find_board(&self, board_id: BoardId) -> RepoResult<Option<Board>> {
        (**self).find_board(board_id)
    }

    fn insert_ownership(&self, ownership: &NewOwnership) -> RepoResult<()> {
        (**self).insert_ownership(ownership)
    }

    fn update_ownership(
        &self,
        board_id: BoardId,
        uid: AccountId,
        patch: &OwnershipPatch,
    ) -> RepoResult<()> {
        (**self).update_ownership(board_id, uid, patch)
    }

    fn find_board_view(&self, uid: AccountId, board_id: BoardId) -> RepoResult<Option<BoardView>> {
        (**self).find_board_view(uid, board_id)
    }

    fn search_board_views(
        &self,
        uid: AccountId,
        query: &BoardViewQuery,
    ) -> RepoResult<Vec<BoardView>> {
        (**self).search_board_views(uid, query)
    }
}

/// SQLite-backed board store.
#[derive(Debug, Clone, Copy)]
pub struct SqliteBoardRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBoardRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &[tables::BOARDS, tables::BOARD_OWNERSHIPS])?;
        Ok(Self { conn })
    }
}

impl BoardRepository for SqliteBoardRepository<'_> {
    fn insert_board(&self, new_board: &NewBoard) -> RepoResult<BoardId> {
        let board_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO boards (board_id, name, owner_uid, visibility)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                board_id.to_string(),
                new_board.name.as_str(),
                new_board.owner_uid.to_string(),
                new_board.visibility.as_str(),
            ],
        )?;
        Ok(board_id)
    }

    fn find_board(&self, board_id: BoardId) -> RepoResult<Option<Board>> {
        let row = self
            .conn
            .query_row(
                "SELECT
                    board_id,
                    name,
                    owner_uid,
                    visibility,
                    is_deleted,
                    created_at,
                    updated_at
                 FROM boards
                 WHERE board_id = ?1;",
                [board_id.to_string()],
                |row| {
                    Ok(RawBoard {
                        board_id: row.get("board_id")?,
                        name: row.get("name")?,
                        owner_uid: row.get("owner_uid")?,
                        visibility: row.get("visibility")?,
                        is_deleted: row.get("is_deleted")?,
                        created_at: row.get("created_at")?,
                        updated_at: row.get("updated_at")?,
                    })
                },
            )
            .optional()?;
        row.map(RawBoard::into_board).transpose()
    }

    fn insert_ownership(&self, ownership: &NewOwnership) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO board_ownerships (board_id, uid, read_only)
             VALUES (?1, ?2, ?3);",
            params![
                ownership.board_id.to_string(),
                ownership.uid.to_string(),
                bool_to_int(ownership.read_only),
            ],
        )?;
        Ok(())
    }

    fn update_ownership(
        &self,
        board_id: BoardId,
        uid: AccountId,
        patch: &OwnershipPatch,
    ) -> RepoResult<()> {
        let mut statement = PatchStatement::default();
        if let Some(read_only) = patch.read_only {
            statement.set("read_only", Value::Integer(bool_to_int(read_only)));
        }
        if let Some(is_favorite) = patch.is_favorite {
            statement.set("is_favorite", Value::Integer(bool_to_int(is_favorite)));
        }
        if let Some(last_open) = patch.last_open {
            statement.set("last_open", Value::Integer(last_open));
        }
        if statement.is_empty() {
            return Ok(());
        }

        let changed = statement.execute(
            self.conn,
            "board_ownerships",
            &[("board_id", board_id), ("uid", uid)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "board ownership",
                id: board_id,
            });
        }
        Ok(())
    }

    fn find_board_view(&self, uid: AccountId, board_id: BoardId) -> RepoResult<Option<BoardView>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOARD_VIEW_SELECT_SQL}
             WHERE o.uid = ?1
               AND o.board_id = ?2
               AND b.is_deleted = 0;"
        ))?;
        let mut rows = stmt.query([uid.to_string(), board_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_board_view_row(row)?));
        }
        Ok(None)
    }

    fn search_board_views(
        &self,
        uid: AccountId,
        query: &BoardViewQuery,
    ) -> RepoResult<Vec<BoardView>> {
        let mut sql = format!(
            "{BOARD_VIEW_SELECT_SQL}
             WHERE o.uid = ?
               AND b.is_deleted = 0"
        );
        let mut values = vec![Value::Text(uid.to_string())];

        if let Some(prefix) = query
            .start_with
            .as_deref()
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
        {
            sql.push_str(" AND b.name LIKE ? ESCAPE '\\'");
            values.push(Value::Text(format!("{}%", escape_like(prefix))));
        }

        sql.push_str(
            "
             ORDER BY o.last_open DESC, b.board_id ASC
             LIMIT ? OFFSET ?;",
        );
        values.push(Value::Integer(i64::from(query.limit)));
        values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            views.push(parse_board_view_row(row)?);
        }
        Ok(views)
    }
}

/// Applies the default page size and upper bound to a requested limit.
pub fn normalize_board_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => BOARD_VIEWS_DEFAULT_LIMIT,
        Some(value) if value > BOARD_VIEWS_LIMIT_MAX => BOARD_VIEWS_LIMIT_MAX,
        Some(value) => value,
    }
}

struct RawBoard {
    board_id: String,
    name: String,
    owner_uid: String,
    visibility: String,
    is_deleted: i64,
    created_at: i64,
    updated_at: i64,
}

impl RawBoard {
    fn into_board(self) -> RepoResult<Board> {
        Ok(Board {
            board_id: parse_uuid(&self.board_id, "boards.board_id")?,
            name: self.name,
            owner_uid: parse_uuid(&self.owner_uid, "boards.owner_uid")?,
            visibility: parse_visibility(&self.visibility)?,
            is_deleted: parse_flag(self.is_deleted, "boards.is_deleted")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_board_view_row(row: &Row<'_>) -> RepoResult<BoardView> {
    let board_id: String = row.get("board_id")?;
    let uid: String = row.get("uid")?;
    let visibility: String = row.get("visibility")?;

    Ok(BoardView {
        board_id: parse_uuid(&board_id, "boards.board_id")?,
        name: row.get("name")?,
        visibility: parse_visibility(&visibility)?,
        uid: parse_uuid(&uid, "board_ownerships.uid")?,
        read_only: parse_flag(row.get("read_only")?, "board_ownerships.read_only")?,
        is_favorite: parse_flag(row.get("is_favorite")?, "board_ownerships.is_favorite")?,
        added_at: row.get("added_at")?,
        last_open: row.get("last_open")?,
    })
}

fn parse_visibility(value: &str) -> RepoResult<BoardVisibility> {
    BoardVisibility::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid visibility `{value}` in boards.visibility"))
    })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, normalize_board_limit};

    #[test]
    fn board_limit_defaults_and_clamps() {
        assert_eq!(normalize_board_limit(None), 10);
        assert_eq!(normalize_board_limit(Some(0)), 10);
        assert_eq!(normalize_board_limit(Some(25)), 25);
        assert_eq!(normalize_board_limit(Some(500)), 50);
    }

    #[test]
    fn escape_like_guards_wildcards() {
        assert_eq!(escape_like("sprint_1"), "sprint\\_1");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("plain"), "plain");
    }
}
