use tokio::sync::broadcast;

use super::models::{StatusCode, TaskId};
use super::mutator::RollbackKind;

/// Capacity of the board event channel. Slow observers that fall further
/// behind than this see `RecvError::Lagged` and should re-read the snapshot.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notifications emitted after every board mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    BoardReplaced {
        revision: u64,
        groups: usize,
        items: usize,
    },
    BoardCleared,
    /// A snapshot was written back over the board.
    BoardRestored {
        revision: u64,
    },
    ItemMoved {
        task_id: TaskId,
        from: StatusCode,
        to: StatusCode,
    },
    ItemInserted {
        task_id: TaskId,
        status: StatusCode,
    },
    MoveConfirmed {
        task_id: TaskId,
        status: StatusCode,
    },
    MoveRolledBack {
        task_id: TaskId,
        from: StatusCode,
        to: StatusCode,
        /// `Skipped` means the board had already been replaced and nothing
        /// on it changed.
        rollback: RollbackKind,
        reason: String,
    },
    LoadFailed {
        workspace_id: i64,
        message: String,
    },
}

pub fn broadcast_event(tx: &broadcast::Sender<BoardEvent>, event: BoardEvent) {
    let _ = tx.send(event); // Ignore error if no receivers
}
