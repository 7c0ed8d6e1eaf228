use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::catalog::StatusCatalog;
use super::events::{BoardEvent, EVENT_CHANNEL_CAPACITY, broadcast_event};
use super::models::{ReferenceItem, StatusCode, StatusGroup, TaskId, WorkItem};

/// Deep copy of the board's groups, used to roll a mutation back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardSnapshot {
    groups: Vec<StatusGroup>,
}

impl BoardSnapshot {
    pub fn groups(&self) -> &[StatusGroup] {
        &self.groups
    }

    pub fn group(&self, code: &StatusCode) -> Option<&StatusGroup> {
        self.groups.iter().find(|g| g.code() == code)
    }

    /// Group and index currently holding `task_id`.
    pub fn locate(&self, task_id: TaskId) -> Option<(&StatusGroup, usize)> {
        locate_in(&self.groups, task_id)
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.tasks.len()).sum()
    }
}

/// In-memory mapping from status to ordered work items.
///
/// Every item id lives in at most one group and its `status` always names
/// that group. `revision` increases on every mutation; `epoch` increases only
/// when the whole board is replaced or cleared.
#[derive(Debug, Default)]
pub struct TaskGroupStore {
    groups: Vec<StatusGroup>,
    revision: u64,
    epoch: u64,
}

impl TaskGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn groups(&self) -> &[StatusGroup] {
        &self.groups
    }

    pub fn group(&self, code: &StatusCode) -> Option<&StatusGroup> {
        self.groups.iter().find(|g| g.code() == code)
    }

    pub fn locate(&self, task_id: TaskId) -> Option<(&StatusGroup, usize)> {
        locate_in(&self.groups, task_id)
    }

    pub fn item(&self, task_id: TaskId) -> Option<&WorkItem> {
        self.locate(task_id).map(|(group, idx)| &group.tasks[idx])
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.locate(task_id).is_some()
    }

    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|g| g.tasks.len()).sum()
    }

    /// Overwrites the whole mapping with a freshly fetched board.
    ///
    /// Incoming data is normalized so the store invariants hold even when the
    /// server sends duplicates or items whose status disagrees with their group.
    pub fn replace_all(&mut self, groups: Vec<StatusGroup>) {
        self.groups = normalize(groups);
        self.epoch += 1;
        self.revision += 1;
    }

    /// Adds an empty group for every status not yet present. Returns how many
    /// groups were created.
    pub fn ensure_groups<'a>(
        &mut self,
        statuses: impl IntoIterator<Item = &'a ReferenceItem>,
    ) -> usize {
        let mut created = 0;
        for status in statuses {
            if self.group_index(status.code()).is_none() {
                self.groups.push(StatusGroup::new(status.clone()));
                created += 1;
            }
        }
        if created > 0 {
            self.revision += 1;
        }
        created
    }

    /// Moves an item to the tail of `to`, returning the board as it was
    /// before the call.
    ///
    /// The item is taken from `from`; if it is not there it is looked up in
    /// the other groups. An item already in `to`, or not on the board at all,
    /// leaves the store untouched so a repeated move never duplicates it.
    pub fn move_item(&mut self, task_id: TaskId, from: &StatusCode, to: &ReferenceItem) -> BoardSnapshot {
        let before = self.snapshot();
        if self.apply_move(task_id, from, to) {
            self.revision += 1;
        }
        before
    }

    fn apply_move(&mut self, task_id: TaskId, from: &StatusCode, to: &ReferenceItem) -> bool {
        let source = self
            .group_index(from)
            .filter(|&gi| self.groups[gi].position_of(task_id).is_some())
            .or_else(|| {
                self.groups
                    .iter()
                    .position(|g| g.position_of(task_id).is_some())
            });

        let Some(gi) = source else {
            debug!(task_id, %from, to = %to.code(), "move skipped: task not on board");
            return false;
        };
        if self.groups[gi].code() == to.code() {
            debug!(task_id, to = %to.code(), "move skipped: task already in target group");
            return false;
        }
        if self.groups[gi].code() != from {
            debug!(
                task_id,
                expected = %from,
                found = %self.groups[gi].code(),
                "moving task from the group it actually sits in"
            );
        }
        let Some(pos) = self.groups[gi].position_of(task_id) else {
            return false;
        };

        let mut item = self.groups[gi].tasks.remove(pos);
        item.status = to.clone();
        self.group_mut_or_create(to).tasks.push(item);
        true
    }

    /// Appends an item to the group matching its status, creating the group
    /// if needed. Duplicate ids are the caller's responsibility.
    pub fn insert_item(&mut self, item: WorkItem) {
        let status = item.status.clone();
        self.group_mut_or_create(&status).tasks.push(item);
        self.revision += 1;
    }

    /// Puts an item back into `status` at `index` (clamped), wherever it
    /// currently sits. Returns false when the item is no longer on the board.
    pub fn revert_move(&mut self, task_id: TaskId, status: &ReferenceItem, index: usize) -> bool {
        let Some(gi) = self
            .groups
            .iter()
            .position(|g| g.position_of(task_id).is_some())
        else {
            return false;
        };
        let Some(pos) = self.groups[gi].position_of(task_id) else {
            return false;
        };

        let mut item = self.groups[gi].tasks.remove(pos);
        item.status = status.clone();
        let group = self.group_mut_or_create(status);
        let index = index.min(group.tasks.len());
        group.tasks.insert(index, item);
        self.revision += 1;
        true
    }

    /// Replaces an item's fields in place with a server-confirmed copy. The
    /// arrangement never changes: an item whose status no longer matches
    /// its group is left alone.
    pub fn refresh_item(&mut self, item: WorkItem) -> bool {
        let Some(gi) = self
            .groups
            .iter()
            .position(|g| g.position_of(item.task_id).is_some())
        else {
            return false;
        };
        let Some(pos) = self.groups[gi].position_of(item.task_id) else {
            return false;
        };
        if self.groups[gi].code() != item.status_code() {
            debug!(
                task_id = item.task_id,
                group = %self.groups[gi].code(),
                confirmed = %item.status_code(),
                "confirmed status differs from board, keeping local copy"
            );
            return false;
        }
        self.groups[gi].tasks[pos] = item;
        self.revision += 1;
        true
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            groups: self.groups.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: BoardSnapshot) {
        self.groups = snapshot.groups;
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.groups.clear();
        self.epoch += 1;
        self.revision += 1;
    }

    fn group_index(&self, code: &StatusCode) -> Option<usize> {
        self.groups.iter().position(|g| g.code() == code)
    }

    fn group_mut_or_create(&mut self, status: &ReferenceItem) -> &mut StatusGroup {
        let idx = match self.group_index(status.code()) {
            Some(idx) => idx,
            None => {
                self.groups.push(StatusGroup::new(status.clone()));
                self.groups.len() - 1
            }
        };
        &mut self.groups[idx]
    }
}

fn locate_in(groups: &[StatusGroup], task_id: TaskId) -> Option<(&StatusGroup, usize)> {
    groups
        .iter()
        .find_map(|g| g.position_of(task_id).map(|idx| (g, idx)))
}

fn normalize(groups: Vec<StatusGroup>) -> Vec<StatusGroup> {
    let mut seen = HashSet::new();
    let mut out: Vec<StatusGroup> = Vec::with_capacity(groups.len());

    for group in groups {
        let target = match out.iter().position(|g| g.code() == group.code()) {
            Some(idx) => {
                warn!(status = %group.code(), "merging duplicate status group");
                idx
            }
            None => {
                out.push(StatusGroup::new(group.status.clone()));
                out.len() - 1
            }
        };

        for mut task in group.tasks {
            if !seen.insert(task.task_id) {
                warn!(task_id = task.task_id, "dropping duplicate task from board response");
                continue;
            }
            if task.status.item_code != *out[target].code() {
                debug!(
                    task_id = task.task_id,
                    listed = %out[target].code(),
                    reported = %task.status.item_code,
                    "task status disagrees with its group, using the group"
                );
                task.status = out[target].status.clone();
            }
            out[target].tasks.push(task);
        }
    }

    out
}

/// Shared, serialized access to the board store plus its event channel.
///
/// All mutations run inside a short synchronous critical section and are
/// never held across an `.await`, so observers only ever see whole
/// mutations.
#[derive(Clone)]
pub struct BoardHandle {
    inner: Arc<Mutex<TaskGroupStore>>,
    events: broadcast::Sender<BoardEvent>,
}

impl Default for BoardHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardHandle {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(TaskGroupStore::new())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub fn read<R>(&self, f: impl FnOnce(&TaskGroupStore) -> R) -> R {
        f(&*self.lock())
    }

    /// Runs `f` with exclusive access. No event is emitted; callers that
    /// change the board report it through [`Self::emit`].
    pub fn update<R>(&self, f: impl FnOnce(&mut TaskGroupStore) -> R) -> R {
        f(&mut *self.lock())
    }

    pub fn emit(&self, event: BoardEvent) {
        broadcast_event(&self.events, event);
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.read(TaskGroupStore::snapshot)
    }

    pub fn replace_all(&self, groups: Vec<StatusGroup>, catalog: &StatusCatalog) {
        let (revision, groups, items) = self.update(|store| {
            store.replace_all(groups);
            store.ensure_groups(catalog.references());
            (store.revision(), store.groups().len(), store.item_count())
        });
        self.emit(BoardEvent::BoardReplaced {
            revision,
            groups,
            items,
        });
    }

    pub fn move_item(&self, task_id: TaskId, from: &StatusCode, to: &ReferenceItem) -> BoardSnapshot {
        let (before, moved) = self.update(|store| {
            let revision = store.revision();
            let before = store.move_item(task_id, from, to);
            (before, store.revision() != revision)
        });
        if moved {
            self.emit(BoardEvent::ItemMoved {
                task_id,
                from: from.clone(),
                to: to.code().clone(),
            });
        }
        before
    }

    pub fn insert_item(&self, item: WorkItem) {
        let task_id = item.task_id;
        let status = item.status_code().clone();
        self.update(|store| store.insert_item(item));
        self.emit(BoardEvent::ItemInserted { task_id, status });
    }

    pub fn restore(&self, snapshot: BoardSnapshot) {
        let revision = self.update(|store| {
            store.restore(snapshot);
            store.revision()
        });
        self.emit(BoardEvent::BoardRestored { revision });
    }

    pub fn clear(&self) {
        self.update(TaskGroupStore::clear);
        self.emit(BoardEvent::BoardCleared);
    }

    fn lock(&self) -> MutexGuard<'_, TaskGroupStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
