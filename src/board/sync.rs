//! Board synchronization: owns the current workspace context, runs fetch
//! cycles under the load guard, and routes gestures and status changes to
//! the mutator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, warn};

use super::catalog::StatusCatalog;
use super::creation::CreationSink;
use super::drag::{DragCoordinator, DragOutcome, GestureHandler, GestureStart, MoveIntent};
use super::events::BoardEvent;
use super::gateway::TaskService;
use super::guard::{LoadGuard, LoadToken};
use super::models::{BoardContext, StatusCode, TaskId, WorkItem};
use super::mutator::{MoveOutcome, OptimisticMutator};
use super::store::BoardHandle;
use super::view::BoardView;
use crate::errors::BoardError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { groups: usize, items: usize },
    /// A newer cycle or a context change overtook this one; nothing was
    /// applied.
    Superseded,
}

pub struct BoardSync<S: ?Sized> {
    service: Arc<S>,
    board: BoardHandle,
    catalog: RwLock<StatusCatalog>,
    guard: LoadGuard,
    context: Mutex<Option<BoardContext>>,
    state: Mutex<LoadState>,
    drag: Mutex<DragCoordinator>,
    mutator: OptimisticMutator<S>,
}

impl<S: TaskService + ?Sized> BoardSync<S> {
    pub fn new(service: Arc<S>) -> Self {
        let board = BoardHandle::new();
        let mutator = OptimisticMutator::new(Arc::clone(&service), board.clone());
        Self {
            service,
            board,
            catalog: RwLock::new(StatusCatalog::new()),
            guard: LoadGuard::new(),
            context: Mutex::new(None),
            state: Mutex::new(LoadState::Idle),
            drag: Mutex::new(DragCoordinator::new()),
            mutator,
        }
    }

    pub fn board(&self) -> &BoardHandle {
        &self.board
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<BoardEvent> {
        self.board.subscribe()
    }

    pub fn state(&self) -> LoadState {
        lock(&self.state).clone()
    }

    pub fn context(&self) -> Option<BoardContext> {
        lock(&self.context).clone()
    }

    pub fn catalog(&self) -> StatusCatalog {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn view(&self) -> BoardView {
        BoardView::project(&self.catalog(), &self.board.snapshot())
    }

    pub fn creation_sink(&self) -> CreationSink {
        CreationSink::new(self.board.clone())
    }

    /// Adds a freshly created task to the board.
    pub fn insert_created(&self, item: WorkItem) {
        self.creation_sink().accept(item);
    }

    /// Runs one fetch cycle for the current context.
    ///
    /// Statuses and groups are fetched concurrently. Results are applied
    /// only if no newer cycle or context change happened in the meantime.
    /// On failure the board keeps its previous contents.
    pub async fn load(&self) -> Result<LoadOutcome, BoardError> {
        let token = self.begin_cycle()?;
        let ctx = token.context().clone();
        info!(workspace_id = ctx.workspace_id, generation = token.generation(), "loading board");

        let fetched = tokio::try_join!(
            StatusCatalog::load(&*self.service, &ctx),
            self.service.fetch_status_groups(&ctx)
        );

        match fetched {
            Ok((catalog, groups)) => {
                let applied = self.guard.apply_if_current(&token, || {
                    self.board.replace_all(groups, &catalog);
                    lock(&self.drag).set_drop_targets(&catalog);
                    *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = catalog;
                    self.set_state(LoadState::Ready);
                    self.board.read(|store| (store.groups().len(), store.item_count()))
                });
                match applied {
                    Some((groups, items)) => {
                        info!(workspace_id = ctx.workspace_id, groups, items, "board loaded");
                        Ok(LoadOutcome::Applied { groups, items })
                    }
                    None => {
                        debug!(
                            workspace_id = ctx.workspace_id,
                            generation = token.generation(),
                            "discarding superseded board response"
                        );
                        Ok(LoadOutcome::Superseded)
                    }
                }
            }
            Err(source) => {
                let message = source.to_string();
                let recorded = self.guard.apply_if_current(&token, || {
                    self.set_state(LoadState::Failed(message.clone()));
                    self.board.emit(BoardEvent::LoadFailed {
                        workspace_id: ctx.workspace_id,
                        message: message.clone(),
                    });
                });
                if recorded.is_none() {
                    debug!(workspace_id = ctx.workspace_id, error = %message, "discarding superseded load failure");
                    return Ok(LoadOutcome::Superseded);
                }
                warn!(workspace_id = ctx.workspace_id, error = %message, "board load failed");
                Err(BoardError::load(ctx.workspace_id, source))
            }
        }
    }

    /// Reads the context and starts a cycle for it under the context lock,
    /// so a concurrent `reset` either precedes the read or invalidates the
    /// token.
    fn begin_cycle(&self) -> Result<LoadToken, BoardError> {
        let context = lock(&self.context);
        let ctx = context.as_ref().ok_or(BoardError::NoContext)?;
        let token = self.guard.begin(ctx);
        self.set_state(LoadState::Loading);
        Ok(token)
    }

    /// Reruns the fetch cycle for the current context.
    pub async fn retry(&self) -> Result<LoadOutcome, BoardError> {
        debug!(state = ?self.state(), "retrying board load");
        self.load().await
    }

    /// Switches to another workspace or credential. Outstanding cycles are
    /// invalidated and the board is emptied before the new cycle starts.
    pub async fn switch_context(&self, ctx: BoardContext) -> Result<LoadOutcome, BoardError> {
        info!(workspace_id = ctx.workspace_id, "switching board context");
        self.reset(Some(ctx));
        self.load().await
    }

    /// Drops the context entirely (sign-out). The board stays empty until a
    /// new context is set.
    pub fn clear_context(&self) {
        info!("clearing board context");
        self.reset(None);
    }

    /// Everything happens under the context lock: no cycle can start for
    /// the new context until the old board is gone.
    fn reset(&self, ctx: Option<BoardContext>) {
        let mut context = lock(&self.context);
        self.guard.invalidate();
        *context = ctx;
        {
            let mut drag = lock(&self.drag);
            drag.on_gesture_cancel();
            drag.set_drop_targets(&StatusCatalog::new());
        }
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = StatusCatalog::new();
        self.board.clear();
        self.set_state(LoadState::Idle);
    }

    pub fn begin_drag(&self, task_id: TaskId) -> Result<GestureStart, BoardError> {
        let item = self
            .board
            .read(|store| store.item(task_id).cloned())
            .ok_or(BoardError::ItemNotFound { task_id })?;
        Ok(lock(&self.drag).on_gesture_start(item))
    }

    pub fn drag_over(&self, target: Option<&StatusCode>) {
        lock(&self.drag).on_gesture_over_target(target);
    }

    pub fn cancel_drag(&self) -> DragOutcome {
        lock(&self.drag).on_gesture_cancel()
    }

    /// Ends the active drag over `target`. Returns `None` when the gesture
    /// resolved without a move.
    pub async fn drop_on(&self, target: Option<&StatusCode>) -> Result<Option<MoveOutcome>, BoardError> {
        let outcome = lock(&self.drag).on_gesture_end(target);
        match outcome {
            DragOutcome::Dropped(intent) => {
                let ctx = self.context().ok_or(BoardError::NoContext)?;
                self.mutator.apply(&ctx, intent).await.map(Some)
            }
            DragOutcome::Cancelled(reason) => {
                debug!(?reason, "drop resolved without a move");
                Ok(None)
            }
            DragOutcome::Ignored => Ok(None),
        }
    }

    /// Status change that does not come from a drag, optionally reassigning
    /// the task at the same time.
    pub async fn change_status(
        &self,
        task_id: TaskId,
        code: &StatusCode,
        assignee_id: Option<i64>,
    ) -> Result<MoveOutcome, BoardError> {
        let ctx = self.context().ok_or(BoardError::NoContext)?;
        let target = self
            .catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(code)
            .map(|def| def.status.clone())
            .ok_or_else(|| BoardError::UnknownStatus { code: code.clone() })?;
        let item = self
            .board
            .read(|store| store.item(task_id).cloned())
            .ok_or(BoardError::ItemNotFound { task_id })?;

        let intent = MoveIntent {
            source: item.status_code().clone(),
            item,
            target,
            assignee_id,
        };
        self.mutator.apply(&ctx, intent).await
    }

    fn set_state(&self, state: LoadState) {
        *lock(&self.state) = state;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
