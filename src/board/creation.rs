use tracing::debug;

use super::models::WorkItem;
use super::store::BoardHandle;

/// Receives tasks produced by the creation workflow and places them on the
/// board.
#[derive(Clone)]
pub struct CreationSink {
    board: BoardHandle,
}

impl CreationSink {
    pub fn new(board: BoardHandle) -> Self {
        Self { board }
    }

    /// Appends `item` to the group for its status. Callers must not hand in
    /// an id that is already on the board.
    pub fn accept(&self, item: WorkItem) {
        debug!(task_id = item.task_id, status = %item.status_code(), "created task added to board");
        self.board.insert_item(item);
    }
}
