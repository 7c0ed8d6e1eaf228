use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::drag::MoveIntent;
use super::events::BoardEvent;
use super::gateway::TaskService;
use super::models::{BoardContext, ReferenceItem, StatusCode, TaskId, UpdateStatusRequest, WorkItem};
use super::store::{BoardHandle, BoardSnapshot, TaskGroupStore};
use crate::errors::{BoardError, GatewayError};

/// How a failed move was undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackKind {
    /// Nothing else touched the board; the pre-move snapshot was restored.
    Restored,
    /// Later mutations exist; only this item was put back.
    Reverted,
    /// The board was reloaded or cleared since the move; nothing to undo.
    Skipped,
}

#[derive(Debug)]
pub enum MoveOutcome {
    Confirmed {
        item: WorkItem,
    },
    RolledBack {
        task_id: TaskId,
        rollback: RollbackKind,
        reason: GatewayError,
    },
}

impl MoveOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// A forward move paired with everything needed to compensate it.
#[derive(Debug, Clone)]
pub struct MoveCommand {
    pub task_id: TaskId,
    pub target: ReferenceItem,
    pub assignee_id: Option<i64>,
    before: BoardSnapshot,
    previous_status: ReferenceItem,
    original_index: usize,
    applied_revision: u64,
    applied_epoch: u64,
}

impl MoveCommand {
    /// Performs the optimistic move on `store`.
    pub fn apply(store: &mut TaskGroupStore, intent: &MoveIntent) -> Result<Self, BoardError> {
        let task_id = intent.item.task_id;
        let (previous_status, original_index) = {
            let (group, index) = store.locate(task_id).ok_or(BoardError::ItemNotFound { task_id })?;
            (group.tasks[index].status.clone(), index)
        };
        if previous_status.code() == intent.target.code() {
            return Err(BoardError::SameStatus {
                task_id,
                code: intent.target.code().clone(),
            });
        }

        let before = store.move_item(task_id, &intent.source, &intent.target);
        Ok(Self {
            task_id,
            target: intent.target.clone(),
            assignee_id: intent.assignee_id,
            before,
            previous_status,
            original_index,
            applied_revision: store.revision(),
            applied_epoch: store.epoch(),
        })
    }

    pub fn source(&self) -> &StatusCode {
        self.previous_status.code()
    }

    pub fn request(&self) -> UpdateStatusRequest {
        UpdateStatusRequest {
            status_code: self.target.code().clone(),
            assignee_id: self.assignee_id,
        }
    }

    /// Folds the server's copy of the item back in without moving it.
    pub fn confirm(&self, store: &mut TaskGroupStore, item: WorkItem) -> bool {
        store.epoch() == self.applied_epoch && store.refresh_item(item)
    }

    /// Undoes the move with the least disruptive action still valid.
    pub fn compensate(self, store: &mut TaskGroupStore) -> RollbackKind {
        if store.epoch() != self.applied_epoch {
            return RollbackKind::Skipped;
        }
        if store.revision() == self.applied_revision {
            store.restore(self.before);
            return RollbackKind::Restored;
        }
        if store.revert_move(self.task_id, &self.previous_status, self.original_index) {
            RollbackKind::Reverted
        } else {
            RollbackKind::Skipped
        }
    }
}

/// Marks a task as having a confirmation pending; released on drop.
struct InFlight {
    tasks: Arc<Mutex<HashSet<TaskId>>>,
    task_id: TaskId,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.task_id);
    }
}

/// Applies moves locally first, confirms them remotely, and rolls back on
/// failure.
pub struct OptimisticMutator<S: ?Sized> {
    service: Arc<S>,
    board: BoardHandle,
    in_flight: Arc<Mutex<HashSet<TaskId>>>,
}

impl<S: TaskService + ?Sized> OptimisticMutator<S> {
    pub fn new(service: Arc<S>, board: BoardHandle) -> Self {
        Self {
            service,
            board,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_in_flight(&self, task_id: TaskId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&task_id)
    }

    fn claim(&self, task_id: TaskId) -> Result<InFlight, BoardError> {
        let mut tasks = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !tasks.insert(task_id) {
            return Err(BoardError::MoveInFlight { task_id });
        }
        Ok(InFlight {
            tasks: Arc::clone(&self.in_flight),
            task_id,
        })
    }

    /// Moves the item immediately, then asks the server to persist it.
    ///
    /// Errors are returned only for moves rejected before anything changed.
    /// A confirmation failure is not an error: the move is undone and the
    /// outcome says so.
    pub async fn apply(&self, ctx: &BoardContext, intent: MoveIntent) -> Result<MoveOutcome, BoardError> {
        let task_id = intent.item.task_id;
        let _claim = self.claim(task_id)?;

        let command = self.board.update(|store| MoveCommand::apply(store, &intent))?;
        debug!(task_id, from = %command.source(), to = %command.target.code(), "optimistic move applied");
        self.board.emit(BoardEvent::ItemMoved {
            task_id,
            from: command.source().clone(),
            to: command.target.code().clone(),
        });

        let request = command.request();
        match self.service.update_task_status(ctx, task_id, &request).await {
            Ok(item) => {
                let status = item.status_code().clone();
                let refreshed = self.board.update(|store| command.confirm(store, item.clone()));
                info!(task_id, status = %status, refreshed, "move confirmed");
                self.board.emit(BoardEvent::MoveConfirmed { task_id, status });
                Ok(MoveOutcome::Confirmed { item })
            }
            Err(reason) => {
                let from = command.target.code().clone();
                let to = command.source().clone();
                let rollback = self.board.update(|store| command.compensate(store));
                warn!(task_id, %from, %to, ?rollback, error = %reason, "move rejected by server, rolled back");
                self.board.emit(BoardEvent::MoveRolledBack {
                    task_id,
                    from,
                    to,
                    rollback,
                    reason: reason.to_string(),
                });
                Ok(MoveOutcome::RolledBack {
                    task_id,
                    rollback,
                    reason,
                })
            }
        }
    }
}
