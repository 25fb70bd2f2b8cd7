use rusqlite::Connection;
use taskboard_core::model::task::Task;
use taskboard_core::repo::task_list_repo::{SqliteTaskListRepository, TaskListRepository};
use taskboard_core::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use taskboard_core::service::task_service::TaskUpdate;
use taskboard_core::{
    open_db_in_memory, AccountId, BoardCore, BoardId, BoardVisibility, CoreConfig, ListId,
    RenameOutcome, ServiceError, TaskId, ValidationError,
};
use uuid::Uuid;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

struct Fixture {
    owner: AccountId,
    board_id: BoardId,
    todo: ListId,
    done: ListId,
}

fn fixture(core: &BoardCore<'_>) -> Fixture {
    let owner = Uuid::new_v4();
    let board_id = core
        .boards()
        .create_board("Sprint", BoardVisibility::Public, owner)
        .unwrap()
        .board_id;
    let todo = core.lists().create(board_id, "Todo", owner).unwrap().list_id;
    let done = core.lists().create(board_id, "Done", owner).unwrap().list_id;
    Fixture {
        owner,
        board_id,
        todo,
        done,
    }
}

fn create_tasks(core: &BoardCore<'_>, list_id: ListId, owner: AccountId, count: usize) -> Vec<TaskId> {
    (0..count)
        .map(|index| {
            core.tasks()
                .create(list_id, &format!("task {index}"), owner)
                .unwrap()
                .task_id
        })
        .collect()
}

fn siblings(conn: &Connection, list_id: ListId) -> Vec<Task> {
    SqliteTaskRepository::try_new(conn)
        .unwrap()
        .find_siblings(list_id)
        .unwrap()
}

fn sibling_ids(conn: &Connection, list_id: ListId) -> Vec<TaskId> {
    siblings(conn, list_id)
        .into_iter()
        .map(|task| task.task_id)
        .collect()
}

#[test]
fn create_appends_floating_positions() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);

    let first = core.tasks().create(f.todo, "Write docs", f.owner).unwrap();
    let second = core.tasks().create(f.todo, "Ship", f.owner).unwrap();

    assert_eq!(first.position, 1024.0);
    assert_eq!(second.position, 2048.0);
    assert_eq!(first.list_id, f.todo);
    assert_eq!(first.creator_id, f.owner);
    assert!(!first.is_finished);
    assert_eq!(first.description, None);
    assert_eq!(first.finished_at, None);
}

#[test]
fn create_rejects_long_title_and_archived_list() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);

    let err = core
        .tasks()
        .create(f.todo, &"t".repeat(129), f.owner)
        .unwrap_err();
    assert!(matches!(
        err.validation(),
        Some(ValidationError::TooLong { field: "title", max: 128, actual: 129 })
    ));

    core.lists().archive(f.done, f.owner).unwrap();
    let err = core.tasks().create(f.done, "late", f.owner).unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::ListArchived(f.done)));
}

#[test]
fn move_into_archived_list_fails_and_leaves_it_untouched() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let task_id = create_tasks(&core, f.todo, f.owner, 1)[0];
    core.lists().archive(f.done, f.owner).unwrap();
    let lists = SqliteTaskListRepository::try_new(&conn).unwrap();
    let archived_before = lists.find_by_id(f.done).unwrap().unwrap();

    let err = core
        .tasks()
        .move_task(task_id, f.done, None, f.owner)
        .unwrap_err();

    assert_eq!(err.validation(), Some(&ValidationError::ListArchived(f.done)));
    assert_eq!(lists.find_by_id(f.done).unwrap().unwrap(), archived_before);
    assert_eq!(sibling_ids(&conn, f.todo), vec![task_id]);
}

#[test]
fn move_across_lists_and_within_list() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let todo = create_tasks(&core, f.todo, f.owner, 3);
    let done = create_tasks(&core, f.done, f.owner, 2);

    let position = core
        .tasks()
        .move_task(todo[1], f.done, Some(done[0]), f.owner)
        .unwrap();
    assert_eq!(position, 1536.0);
    assert_eq!(sibling_ids(&conn, f.done), vec![done[0], todo[1], done[1]]);
    assert_eq!(sibling_ids(&conn, f.todo), vec![todo[0], todo[2]]);

    let position = core
        .tasks()
        .move_task(todo[2], f.todo, None, f.owner)
        .unwrap();
    assert_eq!(position, 512.0);
    assert_eq!(sibling_ids(&conn, f.todo), vec![todo[2], todo[0]]);
}

#[test]
fn round_trip_places_task_right_after_anchor_in_both_directions() {
    for count in [3usize, 5, 50] {
        let conn = setup();
        let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
        let f = fixture(&core);
        let ids = create_tasks(&core, f.todo, f.owner, count);

        for (moving, anchor) in [(ids[0], ids[count / 2]), (ids[count - 1], ids[count / 4])] {
            let mut expected: Vec<TaskId> = sibling_ids(&conn, f.todo)
                .into_iter()
                .filter(|id| *id != moving)
                .collect();
            let anchor_idx = expected.iter().position(|id| *id == anchor).unwrap();
            expected.insert(anchor_idx + 1, moving);

            core.tasks()
                .move_task(moving, f.todo, Some(anchor), f.owner)
                .unwrap();

            let tasks = siblings(&conn, f.todo);
            let actual: Vec<TaskId> = tasks.iter().map(|task| task.task_id).collect();
            assert_eq!(actual, expected, "count={count}");
            assert!(tasks.windows(2).all(|pair| pair[0].position < pair[1].position));
        }
    }
}

#[test]
fn move_rejects_self_anchor() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let ids = create_tasks(&core, f.todo, f.owner, 2);

    let err = core
        .tasks()
        .move_task(ids[0], f.todo, Some(ids[0]), f.owner)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::SelfAfter(ids[0])));
}

#[test]
fn repeated_task_inserts_rebalance_the_list() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let anchor = create_tasks(&core, f.todo, f.owner, 2)[0];

    let mut rebalanced = false;
    for round in 1..=11 {
        let moving = core
            .tasks()
            .create(f.todo, &format!("round {round}"), f.owner)
            .unwrap()
            .task_id;
        let position = core
            .tasks()
            .move_task(moving, f.todo, Some(anchor), f.owner)
            .unwrap();

        let tasks = siblings(&conn, f.todo);
        assert_eq!(tasks[1].task_id, moving);
        assert!(tasks.windows(2).all(|pair| pair[0].position < pair[1].position));
        if position == 2048.0 {
            rebalanced = true;
            for (index, task) in tasks.iter().enumerate() {
                assert_eq!(task.position, 1024.0 * (index as f64 + 1.0));
            }
        }
    }
    assert!(rebalanced);
}

#[test]
fn rename_and_update_edit_content_only() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let created = core.tasks().create(f.todo, "Draft", f.owner).unwrap();

    assert_eq!(
        core.tasks().rename(created.task_id, "Draft", f.owner).unwrap(),
        RenameOutcome::Unchanged
    );
    assert_eq!(
        core.tasks().rename(created.task_id, "Final", f.owner).unwrap(),
        RenameOutcome::Renamed
    );

    let updated = core
        .tasks()
        .update(
            created.task_id,
            TaskUpdate {
                description: Some("with details".to_string()),
                date: Some(1_767_225_600_000),
                ..TaskUpdate::default()
            },
            f.owner,
        )
        .unwrap();
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description.as_deref(), Some("with details"));
    assert_eq!(updated.date, Some(1_767_225_600_000));
    assert_eq!(updated.position, created.position);
}

#[test]
fn update_validates_input() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let task_id = create_tasks(&core, f.todo, f.owner, 1)[0];

    let err = core
        .tasks()
        .update(task_id, TaskUpdate::default(), f.owner)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::NoChanges));

    let err = core
        .tasks()
        .update(
            task_id,
            TaskUpdate {
                description: Some("d".repeat(1025)),
                ..TaskUpdate::default()
            },
            f.owner,
        )
        .unwrap_err();
    assert!(matches!(
        err.validation(),
        Some(ValidationError::TooLong { field: "description", .. })
    ));
}

#[test]
fn set_finished_stamps_and_clears_finished_at() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let task_id = create_tasks(&core, f.todo, f.owner, 1)[0];

    let finished = core.tasks().set_finished(task_id, true, f.owner).unwrap();
    assert!(finished.is_finished);
    assert!(finished.finished_at.is_some());

    let again = core.tasks().set_finished(task_id, true, f.owner).unwrap();
    assert_eq!(again, finished);

    let reopened = core.tasks().set_finished(task_id, false, f.owner).unwrap();
    assert!(!reopened.is_finished);
    assert_eq!(reopened.finished_at, None);
}

#[test]
fn archived_task_or_list_blocks_mutation() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let ids = create_tasks(&core, f.todo, f.owner, 2);

    core.tasks().archive(ids[0], f.owner).unwrap();
    assert_eq!(sibling_ids(&conn, f.todo), vec![ids[1]]);
    let err = core.tasks().rename(ids[0], "revive", f.owner).unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::TaskArchived(ids[0])));

    core.lists().archive(f.todo, f.owner).unwrap();
    let err = core
        .tasks()
        .set_finished(ids[1], true, f.owner)
        .unwrap_err();
    assert_eq!(err.validation(), Some(&ValidationError::ListArchived(f.todo)));
}

#[test]
fn read_only_viewer_cannot_touch_tasks() {
    let conn = setup();
    let core = BoardCore::try_new(&conn, CoreConfig::default()).unwrap();
    let f = fixture(&core);
    let reader = Uuid::new_v4();
    let ids = create_tasks(&core, f.todo, f.owner, 2);
    core.boards()
        .share_board(f.board_id, f.owner, reader, true)
        .unwrap();

    let unauthorized = |err: ServiceError| matches!(err, ServiceError::Unauthorized { uid, .. } if uid == reader);
    assert!(unauthorized(core.tasks().create(f.todo, "x", reader).unwrap_err()));
    assert!(unauthorized(core.tasks().rename(ids[0], "x", reader).unwrap_err()));
    assert!(unauthorized(
        core.tasks()
            .move_task(ids[0], f.done, None, reader)
            .unwrap_err()
    ));
    assert!(unauthorized(core.tasks().archive(ids[0], reader).unwrap_err()));
    assert!(unauthorized(
        core.tasks().set_finished(ids[0], true, reader).unwrap_err()
    ));
    assert_eq!(sibling_ids(&conn, f.todo), ids);
}
