use std::sync::{Mutex, MutexGuard, PoisonError};

use super::models::BoardContext;

/// Identifies one fetch cycle. Only the token from the most recent
/// [`LoadGuard::begin`] is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadToken {
    generation: u64,
    context: BoardContext,
}

impl LoadToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn context(&self) -> &BoardContext {
        &self.context
    }
}

#[derive(Debug, Default)]
struct GuardState {
    generation: u64,
    context: Option<BoardContext>,
}

/// Guarantees at most one fetch cycle's results are ever applied.
///
/// Starting a cycle or changing context supersedes every earlier token, so
/// late responses from an old workspace can never overwrite the board.
#[derive(Debug, Default)]
pub struct LoadGuard {
    state: Mutex<GuardState>,
}

impl LoadGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new cycle for `context`, superseding all earlier ones.
    pub fn begin(&self, context: &BoardContext) -> LoadToken {
        let mut state = self.lock();
        state.generation += 1;
        state.context = Some(context.clone());
        LoadToken {
            generation: state.generation,
            context: context.clone(),
        }
    }

    pub fn is_current(&self, token: &LoadToken) -> bool {
        Self::matches(&self.lock(), token)
    }

    /// Supersedes every outstanding token without starting a new cycle.
    pub fn invalidate(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.context = None;
    }

    /// Runs `apply` only if `token` is still current, holding the guard for
    /// the duration so no newer cycle can start in between.
    pub fn apply_if_current<R>(&self, token: &LoadToken, apply: impl FnOnce() -> R) -> Option<R> {
        let state = self.lock();
        if !Self::matches(&state, token) {
            return None;
        }
        Some(apply())
    }

    fn matches(state: &GuardState, token: &LoadToken) -> bool {
        state.generation == token.generation && state.context.as_ref() == Some(&token.context)
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
