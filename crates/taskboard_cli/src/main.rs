//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskboard_core` linkage and print version info.
//! - Run a small list reorder against an in-memory database and print the
//!   resulting board content as JSON.
//!
//! Usage: `taskboard_cli [config.json]`

use std::error::Error;
use taskboard_core::{open_db_in_memory, BoardCore, BoardVisibility, CoreConfig};
use uuid::Uuid;

fn main() {
    println!("taskboard_core ping={}", taskboard_core::ping());
    println!("taskboard_core version={}", taskboard_core::core_version());

    if let Err(err) = run_reorder_demo() {
        eprintln!("demo failed: {err}");
        std::process::exit(1);
    }
}

fn load_config() -> Result<CoreConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => Ok(CoreConfig::from_json_str(&std::fs::read_to_string(path)?)?),
        None => Ok(CoreConfig::default()),
    }
}

fn run_reorder_demo() -> Result<(), Box<dyn Error>> {
    let config = load_config()?;
    let conn = open_db_in_memory()?;
    let core = BoardCore::try_new(&conn, config)?;
    let owner = Uuid::new_v4();

    let board = core
        .boards()
        .create_board("Demo", BoardVisibility::Private, owner)?;
    let mut lists = Vec::new();
    for name in ["Backlog", "Doing", "Done"] {
        lists.push(core.lists().create(board.board_id, name, owner)?);
    }
    let backlog = lists[0].list_id;
    core.tasks().create(backlog, "Write the plan", owner)?;
    core.tasks().create(backlog, "Review the plan", owner)?;

    let position = core
        .lists()
        .move_list(backlog, board.board_id, Some(lists[1].list_id), owner)?;
    println!("moved Backlog after Doing position={position}");

    let content = core.reader().read_board_content(board.board_id, owner)?;
    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}
