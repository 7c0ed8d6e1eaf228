//! Drag-and-drop gesture resolution.
//!
//! The coordinator turns raw gesture callbacks into at most one
//! [`MoveIntent`] per gesture. It never touches the store: a dropped
//! intent is handed to the mutator by the caller.

use tracing::debug;

use super::catalog::StatusCatalog;
use super::models::{ReferenceItem, StatusCode, WorkItem};

/// A drag in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession {
    pub item: WorkItem,
    pub source: StatusCode,
    /// Valid drop target currently under the pointer, if any.
    pub hover: Option<StatusCode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Request to move an item to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    pub item: WorkItem,
    pub source: StatusCode,
    pub target: ReferenceItem,
    pub assignee_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// Released outside every column.
    NoTarget,
    /// Released over something that is not a status in the catalog.
    InvalidTarget(StatusCode),
    /// Released over the column it started in.
    SameStatus,
    /// Aborted by the host (escape key, context switch).
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    Dropped(MoveIntent),
    Cancelled(CancelReason),
    /// No drag was active.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureStart {
    Started,
    /// Another drag is already active.
    Rejected,
}

/// Callbacks a host UI forwards from its pointer or touch recognizer.
pub trait GestureHandler {
    fn on_gesture_start(&mut self, item: WorkItem) -> GestureStart;
    fn on_gesture_over_target(&mut self, target: Option<&StatusCode>);
    fn on_gesture_end(&mut self, target: Option<&StatusCode>) -> DragOutcome;
    fn on_gesture_cancel(&mut self) -> DragOutcome;
}

/// Single-drag state machine over the current catalog's drop targets.
#[derive(Debug, Default)]
pub struct DragCoordinator {
    state: DragState,
    targets: Vec<ReferenceItem>,
}

impl DragCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every catalog status becomes a valid drop target.
    pub fn set_drop_targets(&mut self, catalog: &StatusCatalog) {
        self.targets = catalog.references().cloned().collect();
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn active_item(&self) -> Option<&WorkItem> {
        match &self.state {
            DragState::Dragging(session) => Some(&session.item),
            DragState::Idle => None,
        }
    }

    pub fn hover_target(&self) -> Option<&StatusCode> {
        match &self.state {
            DragState::Dragging(session) => session.hover.as_ref(),
            DragState::Idle => None,
        }
    }

    fn target(&self, code: &StatusCode) -> Option<&ReferenceItem> {
        self.targets.iter().find(|t| t.code() == code)
    }
}

impl GestureHandler for DragCoordinator {
    fn on_gesture_start(&mut self, item: WorkItem) -> GestureStart {
        if let DragState::Dragging(active) = &self.state {
            debug!(
                active = active.item.task_id,
                rejected = item.task_id,
                "drag rejected: another drag is active"
            );
            return GestureStart::Rejected;
        }
        debug!(task_id = item.task_id, source = %item.status_code(), "drag started");
        let source = item.status_code().clone();
        self.state = DragState::Dragging(DragSession {
            item,
            source,
            hover: None,
        });
        GestureStart::Started
    }

    fn on_gesture_over_target(&mut self, target: Option<&StatusCode>) {
        let hover = target.filter(|code| self.target(code).is_some()).cloned();
        if let DragState::Dragging(session) = &mut self.state {
            session.hover = hover;
        }
    }

    fn on_gesture_end(&mut self, target: Option<&StatusCode>) -> DragOutcome {
        let DragState::Dragging(session) = std::mem::take(&mut self.state) else {
            return DragOutcome::Ignored;
        };
        let task_id = session.item.task_id;

        let Some(code) = target else {
            debug!(task_id, "drag cancelled: released outside the board");
            return DragOutcome::Cancelled(CancelReason::NoTarget);
        };
        let Some(target) = self.target(code).cloned() else {
            debug!(task_id, target = %code, "drag cancelled: not a drop target");
            return DragOutcome::Cancelled(CancelReason::InvalidTarget(code.clone()));
        };
        if target.code() == &session.source {
            debug!(task_id, "drag cancelled: dropped on its own column");
            return DragOutcome::Cancelled(CancelReason::SameStatus);
        }

        debug!(task_id, from = %session.source, to = %target.code(), "drag dropped");
        DragOutcome::Dropped(MoveIntent {
            item: session.item,
            source: session.source,
            target,
            assignee_id: None,
        })
    }

    fn on_gesture_cancel(&mut self) -> DragOutcome {
        match std::mem::take(&mut self.state) {
            DragState::Dragging(session) => {
                debug!(task_id = session.item.task_id, "drag cancelled by host");
                DragOutcome::Cancelled(CancelReason::External)
            }
            DragState::Idle => DragOutcome::Ignored,
        }
    }
}
