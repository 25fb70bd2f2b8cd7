//! Domain model for boards, task lists and tasks.
//!
//! # Responsibility
//! - Define canonical records returned by repositories and services.
//! - Keep identity and lifecycle helpers next to the data they describe.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID.
//! - Archiving is a soft, terminal flag; rows are never hard-deleted.

pub mod board;
pub mod content;
pub mod task;
pub mod task_list;

use uuid::Uuid;

/// Stable board identifier.
pub type BoardId = Uuid;
/// Stable task list identifier.
pub type ListId = Uuid;
/// Stable task identifier.
pub type TaskId = Uuid;
/// Account identifier issued by the (external) account system.
pub type AccountId = Uuid;
