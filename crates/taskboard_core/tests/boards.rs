use rusqlite::Connection;
use taskboard_core::repo::board_repo::{BoardRepository, OwnershipPatch, SqliteBoardRepository};
use taskboard_core::repo::board_view_cache::BoardViewLookup;
use taskboard_core::service::board_service::BoardListQuery;
use taskboard_core::{
    open_db_in_memory, AccountId, BoardCore, BoardId, BoardVisibility, CoreConfig, ServiceError,
    ValidationError,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn new_board(core: &BoardCore<'_>, name: &str, owner: AccountId) -> BoardId {
    core.boards()
        .create_board(name, BoardVisibility::Private, owner)
        .unwrap()
        .board_id
}

fn set_last_open(conn: &Connection, board_id: BoardId, uid: AccountId, last_open: i64) {
    SqliteBoardRepository::try_new(conn)
        .unwrap()
        .update_ownership(
            board_id,
            uid,
            &OwnershipPatch {
                last_open: Some(last_open),
                ..OwnershipPatch::default()
            },
        )
        .unwrap();
}

#[test]
fn create_board_returns_writable_owner_view() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();

    let view = core
        .boards()
        .create_board("Roadmap", BoardVisibility::Public, owner)
        .unwrap();

    assert_eq!(view.name, "Roadmap");
    assert_eq!(view.uid, owner);
    assert_eq!(view.visibility, BoardVisibility::Public);
    assert!(view.is_writable());
    assert!(!view.is_favorite);

    let board = SqliteBoardRepository::try_new(&conn)
        .unwrap()
        .find_board(view.board_id)
        .unwrap()
        .unwrap();
    assert_eq!(board.owner_uid, owner);
    assert!(!board.is_deleted);
}

#[test]
fn create_board_rejects_blank_name() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();

    let err = core
        .boards()
        .create_board("", BoardVisibility::Private, Uuid::new_v4())
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::BlankField { field: "name" })
    );
}

#[test]
fn list_boards_orders_by_last_open_and_filters_prefix() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let roadmap = new_board(&core, "Roadmap", owner);
    let roadtrip = new_board(&core, "roadtrip", owner);
    let backlog = new_board(&core, "Backlog", owner);
    let snake = new_board(&core, "a_b", owner);
    let wildcard_bait = new_board(&core, "axb", owner);
    set_last_open(&conn, roadmap, owner, 1_000);
    set_last_open(&conn, roadtrip, owner, 3_000);
    set_last_open(&conn, backlog, owner, 2_000);
    set_last_open(&conn, snake, owner, 500);
    set_last_open(&conn, wildcard_bait, owner, 100);

    let all = core
        .boards()
        .list_boards(owner, &BoardListQuery::default())
        .unwrap();
    assert_eq!(all.applied_limit, 10);
    let ids: Vec<BoardId> = all.items.iter().map(|view| view.board_id).collect();
    assert_eq!(ids, vec![roadtrip, backlog, roadmap, snake, wildcard_bait]);

    let filtered = core
        .boards()
        .list_boards(
            owner,
            &BoardListQuery {
                start_with: Some("ROAD".to_string()),
                ..BoardListQuery::default()
            },
        )
        .unwrap();
    let ids: Vec<BoardId> = filtered.items.iter().map(|view| view.board_id).collect();
    assert_eq!(ids, vec![roadtrip, roadmap]);

    let literal = core
        .boards()
        .list_boards(
            owner,
            &BoardListQuery {
                start_with: Some("a_".to_string()),
                ..BoardListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(literal.items.len(), 1);
    assert_eq!(literal.items[0].board_id, snake);

    let paged = core
        .boards()
        .list_boards(
            owner,
            &BoardListQuery {
                limit: Some(500),
                offset: 3,
                ..BoardListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(paged.applied_limit, 50);
    let ids: Vec<BoardId> = paged.items.iter().map(|view| view.board_id).collect();
    assert_eq!(ids, vec![snake, wildcard_bait]);
}

#[test]
fn list_boards_only_shows_own_records() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    new_board(&core, "Roadmap", owner);

    let result = core
        .boards()
        .list_boards(stranger, &BoardListQuery::default())
        .unwrap();
    assert!(result.items.is_empty());
}

#[test]
fn set_favorite_evicts_cached_view() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let board_id = new_board(&core, "Roadmap", owner);

    let cached = core.view_cache().find(owner, board_id).unwrap().unwrap();
    assert!(!cached.is_favorite);

    core.boards().set_favorite(board_id, owner, true).unwrap();

    let fresh = core.resolver().path_of_board(board_id, owner).unwrap();
    assert!(fresh.board_view.unwrap().is_favorite);
}

#[test]
fn set_favorite_on_unknown_board_is_a_validation_error() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let missing = Uuid::new_v4();

    let err = core
        .boards()
        .set_favorite(missing, Uuid::new_v4(), true)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::BoardNotFound(missing)));
}

#[test]
fn open_board_moves_it_to_the_front() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let first = new_board(&core, "First", owner);
    let second = new_board(&core, "Second", owner);
    set_last_open(&conn, first, owner, 1_000);
    set_last_open(&conn, second, owner, 2_000);

    let view = core.boards().open_board(first, owner).unwrap();
    assert!(view.last_open > 2_000);

    let listed = core
        .boards()
        .list_boards(owner, &BoardListQuery::default())
        .unwrap();
    assert_eq!(listed.items[0].board_id, first);
}

#[test]
fn share_board_grants_and_updates_access() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let board_id = new_board(&core, "Roadmap", owner);

    let view = core
        .boards()
        .share_board(board_id, owner, member, false)
        .unwrap();
    assert!(view.is_writable());
    core.lists().create(board_id, "Member list", member).unwrap();

    let view = core
        .boards()
        .share_board(board_id, owner, member, true)
        .unwrap();
    assert!(view.read_only);

    let err = core.lists().create(board_id, "Blocked", member).unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized { uid, .. } if uid == member));
}

#[test]
fn share_board_is_owner_only() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let member = Uuid::new_v4();
    let outsider = Uuid::new_v4();
    let board_id = new_board(&core, "Roadmap", owner);
    core.boards()
        .share_board(board_id, owner, member, false)
        .unwrap();

    let err = core
        .boards()
        .share_board(board_id, member, outsider, false)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized { uid, .. } if uid == member));

    let err = core
        .boards()
        .share_board(board_id, owner, owner, true)
        .unwrap_err();
    assert_eq!(
        err.validation(),
        Some(&ValidationError::OwnerAccessImmutable(board_id))
    );

    let missing = Uuid::new_v4();
    let err = core
        .boards()
        .share_board(missing, owner, member, true)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::BoardNotFound(missing)));
}

#[test]
fn read_board_content_returns_active_entities_in_order() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let reader = Uuid::new_v4();
    let board_id = new_board(&core, "Roadmap", owner);
    let todo = core.lists().create(board_id, "Todo", owner).unwrap().list_id;
    let done = core.lists().create(board_id, "Done", owner).unwrap().list_id;
    let dropped = core.lists().create(board_id, "Dropped", owner).unwrap().list_id;
    let a = core.tasks().create(todo, "a", owner).unwrap().task_id;
    let b = core.tasks().create(todo, "b", owner).unwrap().task_id;
    let c = core.tasks().create(todo, "c", owner).unwrap().task_id;
    core.tasks().move_task(c, todo, None, owner).unwrap();
    core.tasks().archive(b, owner).unwrap();
    core.lists().move_list(done, board_id, None, owner).unwrap();
    core.lists().archive(dropped, owner).unwrap();
    core.boards()
        .share_board(board_id, owner, reader, true)
        .unwrap();

    let content = core.reader().read_board_content(board_id, reader).unwrap();

    assert_eq!(content.board_id, board_id);
    assert!(content.read_only);
    let list_ids: Vec<_> = content.lists.iter().map(|list| list.list_id).collect();
    assert_eq!(list_ids, vec![done, todo]);
    assert!(content.lists[0].tasks.is_empty());
    let task_ids: Vec<_> = content.lists[1].tasks.iter().map(|task| task.task_id).collect();
    assert_eq!(task_ids, vec![c, a]);
}

#[test]
fn read_board_content_requires_a_view() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let board_id = new_board(&core, "Roadmap", owner);

    let err = core
        .reader()
        .read_board_content(board_id, stranger)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::BoardNotFound(board_id)));
}
