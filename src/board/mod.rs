//! Task board: status-grouped kanban state kept in sync with the gateway.
//!
//! ## Overview
//!
//! The board holds a workspace's tasks grouped by status. Cards are moved
//! optimistically: the local board changes first, the gateway is asked to
//! persist the change, and the move is undone if the gateway refuses.
//! Fetch cycles are tied to the current (workspace, credential) pair so a
//! slow response for an old workspace can never overwrite the board.
//!
//! ## Module Map
//!
//! ```text
//!  gestures ──> drag.rs (DragCoordinator) ──MoveIntent──┐
//!                                                       v
//!  sync.rs (BoardSync) ──────────────────────> mutator.rs (OptimisticMutator)
//!     │  load / switch_context                          │ MoveCommand apply/compensate
//!     │  guard.rs (LoadGuard, LoadToken)                │
//!     v                                                 v
//!  gateway.rs (TaskService, GatewayClient)      store.rs (BoardHandle → TaskGroupStore)
//!                                                       │ BoardEvent
//!                                                       v
//!                                               events.rs (broadcast)
//! ```
//!
//! ## Supporting Modules
//!
//! | Module     | Responsibility                                             |
//! |------------|------------------------------------------------------------|
//! | `models`   | Wire types: `WorkItem`, `ReferenceItem`, `StatusGroup`     |
//! | `catalog`  | `StatusCatalog`, ordered statuses and their colors         |
//! | `creation` | `CreationSink`, inserts newly created tasks                |
//! | `view`     | `BoardView`, catalog-ordered columns for rendering         |
//!
//! ## Typical Flow (drag a card to "Done")
//!
//! 1. `BoardSync::begin_drag(id)` starts a `DragSession`.
//! 2. `BoardSync::drop_on(Some("DONE"))` resolves it into a `MoveIntent`.
//! 3. `OptimisticMutator::apply` moves the card in the store, emits
//!    `ItemMoved`, then sends `PUT /tasks/{id}/status`.
//! 4. On success it emits `MoveConfirmed`; on failure the move is
//!    compensated and `MoveRolledBack` is emitted with the `RollbackKind`
//!    (`Skipped` when a reload already replaced the board).

pub mod catalog;
pub mod creation;
pub mod drag;
pub mod events;
pub mod gateway;
pub mod guard;
pub mod models;
pub mod mutator;
pub mod store;
pub mod sync;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{StatusCatalog, StatusColor};
pub use gateway::{GatewayClient, GatewayEndpoints, TaskService};
pub use models::{BoardContext, Credential, StatusCode, TaskId, WorkItem};
pub use sync::{BoardSync, LoadOutcome, LoadState};
