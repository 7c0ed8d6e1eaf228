//! Shared fixtures and an in-memory `TaskService` for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::gateway::TaskService;
use super::models::{
    BoardContext, Credential, Member, ReferenceItem, StatusGroup, TaskId, UpdateStatusRequest, WorkItem,
};
use crate::errors::GatewayError;

pub fn todo() -> ReferenceItem {
    ReferenceItem::new("TODO", "To do")
}

pub fn done() -> ReferenceItem {
    ReferenceItem::new("DONE", "Done")
}

pub fn item(task_id: TaskId, status: ReferenceItem) -> WorkItem {
    WorkItem::new(task_id, format!("Task {}", task_id), status)
}

pub fn group(status: ReferenceItem, tasks: Vec<WorkItem>) -> StatusGroup {
    StatusGroup { status, tasks }
}

pub fn ctx(workspace_id: i64) -> BoardContext {
    BoardContext::new(workspace_id, Credential::new(format!("token-{}", workspace_id)))
}

/// How a stubbed request should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Status(u16),
    Malformed,
}

impl Failure {
    fn to_error(self, url: &str) -> GatewayError {
        match self {
            Self::Status(status) => GatewayError::Status {
                url: url.to_string(),
                status,
            },
            Self::Malformed => GatewayError::Decode {
                url: url.to_string(),
                source: serde_json::from_str::<serde_json::Value>("{\"tasks\": [").unwrap_err(),
            },
        }
    }
}

/// Holds a stubbed request until the test releases it.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.started.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug, Clone, Default)]
struct WorkspaceData {
    statuses: Vec<ReferenceItem>,
    groups: Vec<StatusGroup>,
}

/// Test double for the gateway. Data is keyed by workspace; workspaces
/// without their own data fall back to the default set.
#[derive(Debug, Default)]
pub struct StubTaskService {
    default: Mutex<WorkspaceData>,
    workspaces: Mutex<HashMap<i64, WorkspaceData>>,
    load_failure: Mutex<Option<Failure>>,
    update_failure: Mutex<Option<Failure>>,
    group_gates: Mutex<HashMap<i64, Gate>>,
    update_gate: Mutex<Option<Gate>>,
    updates: Mutex<Vec<(TaskId, UpdateStatusRequest)>>,
    loads: Mutex<Vec<i64>>,
}

impl StubTaskService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(self, statuses: Vec<ReferenceItem>) -> Self {
        self.default.lock().unwrap().statuses = statuses;
        self
    }

    pub fn with_groups(self, groups: Vec<StatusGroup>) -> Self {
        self.default.lock().unwrap().groups = groups;
        self
    }

    pub fn with_workspace(self, workspace_id: i64, statuses: Vec<ReferenceItem>, groups: Vec<StatusGroup>) -> Self {
        self.workspaces
            .lock()
            .unwrap()
            .insert(workspace_id, WorkspaceData { statuses, groups });
        self
    }

    pub fn fail_loads(&self, failure: Option<Failure>) {
        *self.load_failure.lock().unwrap() = failure;
    }

    pub fn fail_updates(&self, failure: Option<Failure>) {
        *self.update_failure.lock().unwrap() = failure;
    }

    /// The next group fetch for `workspace_id` blocks until released.
    pub fn hold_groups(&self, workspace_id: i64) -> Gate {
        let gate = Gate::default();
        self.group_gates.lock().unwrap().insert(workspace_id, gate.clone());
        gate
    }

    /// The next status update blocks until released.
    pub fn hold_updates(&self) -> Gate {
        let gate = Gate::default();
        *self.update_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn updates(&self) -> Vec<(TaskId, UpdateStatusRequest)> {
        self.updates.lock().unwrap().clone()
    }

    /// Workspaces whose groups were fetched, in call order.
    pub fn loads(&self) -> Vec<i64> {
        self.loads.lock().unwrap().clone()
    }

    fn data(&self, workspace_id: i64) -> WorkspaceData {
        self.workspaces
            .lock()
            .unwrap()
            .get(&workspace_id)
            .cloned()
            .unwrap_or_else(|| self.default.lock().unwrap().clone())
    }
}

#[async_trait]
impl TaskService for StubTaskService {
    async fn fetch_statuses(&self, ctx: &BoardContext) -> Result<Vec<ReferenceItem>, GatewayError> {
        if let Some(failure) = *self.load_failure.lock().unwrap() {
            return Err(failure.to_error("stub://references/items"));
        }
        Ok(self.data(ctx.workspace_id).statuses)
    }

    async fn fetch_status_groups(&self, ctx: &BoardContext) -> Result<Vec<StatusGroup>, GatewayError> {
        self.loads.lock().unwrap().push(ctx.workspace_id);
        let gate = self.group_gates.lock().unwrap().remove(&ctx.workspace_id);
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(failure) = *self.load_failure.lock().unwrap() {
            return Err(failure.to_error("stub://tasks/statusGroup"));
        }
        Ok(self.data(ctx.workspace_id).groups)
    }

    async fn update_task_status(
        &self,
        ctx: &BoardContext,
        task_id: TaskId,
        request: &UpdateStatusRequest,
    ) -> Result<WorkItem, GatewayError> {
        self.updates.lock().unwrap().push((task_id, request.clone()));
        let gate = self.update_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(failure) = *self.update_failure.lock().unwrap() {
            return Err(failure.to_error("stub://tasks/status"));
        }

        let data = self.data(ctx.workspace_id);
        let status = data
            .statuses
            .iter()
            .find(|s| s.code() == &request.status_code)
            .cloned()
            .unwrap_or_else(|| ReferenceItem::new(request.status_code.clone(), request.status_code.as_str()));
        let mut updated = data
            .groups
            .iter()
            .flat_map(|g| g.tasks.iter())
            .find(|t| t.task_id == task_id)
            .cloned()
            .unwrap_or_else(|| item(task_id, status.clone()));
        updated.status = status;
        if let Some(member_id) = request.assignee_id {
            updated.assignee = Some(Member {
                member_id,
                username: format!("member{}", member_id),
                email: String::new(),
                first_name: "Member".into(),
                last_name: member_id.to_string(),
                middle_name: None,
                avatar_url: None,
            });
        }
        Ok(updated)
    }
}
