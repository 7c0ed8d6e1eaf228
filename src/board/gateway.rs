//! Remote task service: the trait the board talks through and its HTTP
//! implementation against the project-management gateway.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{BoardContext, ReferenceItem, StatusGroup, TaskId, UpdateStatusRequest, WorkItem};
use crate::errors::GatewayError;

/// Reference type under which task statuses are registered.
pub const TASK_STATUS_REFERENCE_TYPE: &str = "TASK_STATUS";

/// Header carrying the active workspace on every gateway request.
pub const WORKSPACE_HEADER: &str = "workspaceId";

/// Remote operations the board depends on. Abstracted so tests can supply
/// an in-memory double.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Status reference items for the workspace, in server order.
    async fn fetch_statuses(&self, ctx: &BoardContext) -> Result<Vec<ReferenceItem>, GatewayError>;

    /// Tasks grouped by status.
    async fn fetch_status_groups(&self, ctx: &BoardContext) -> Result<Vec<StatusGroup>, GatewayError>;

    /// Persists a status change and returns the updated task.
    async fn update_task_status(
        &self,
        ctx: &BoardContext,
        task_id: TaskId,
        request: &UpdateStatusRequest,
    ) -> Result<WorkItem, GatewayError>;
}

/// Resolved service locations behind the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoints {
    base_url: String,
    reference_path: String,
    aggregator_path: String,
    tasks_path: String,
}

impl GatewayEndpoints {
    pub fn new(
        base_url: &str,
        reference_path: &str,
        aggregator_path: &str,
        tasks_path: &str,
    ) -> Result<Self, GatewayError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(GatewayError::InvalidUrl {
                url: base_url.to_string(),
                message: "must start with http:// or https://".into(),
            });
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            reference_path: normalize_path(reference_path),
            aggregator_path: normalize_path(aggregator_path),
            tasks_path: normalize_path(tasks_path),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn statuses_url(&self) -> String {
        format!("{}{}/references/items", self.base_url, self.reference_path)
    }

    pub fn status_groups_url(&self) -> String {
        format!("{}{}/tasks/statusGroup", self.base_url, self.aggregator_path)
    }

    pub fn task_status_url(&self, task_id: TaskId) -> String {
        format!("{}{}/tasks/{}/status", self.base_url, self.tasks_path, task_id)
    }
}

/// `""` and `"/"` collapse to nothing; otherwise a single leading slash and
/// no trailing one.
fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// HTTP client for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    endpoints: GatewayEndpoints,
}

impl GatewayClient {
    pub fn new(endpoints: GatewayEndpoints, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("taskboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| GatewayError::Transport {
                url: endpoints.base_url().to_string(),
                source,
            })?;
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &GatewayEndpoints {
        &self.endpoints
    }

    fn authorized(&self, request: reqwest::RequestBuilder, ctx: &BoardContext) -> reqwest::RequestBuilder {
        request
            .bearer_auth(ctx.credential.expose())
            .header(WORKSPACE_HEADER, ctx.workspace_id.to_string())
            .header("Accept", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, url: &str, request: reqwest::RequestBuilder) -> Result<T, GatewayError> {
        let resp = request.send().await.map_err(|source| GatewayError::Transport {
            url: url.to_string(),
            source,
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|source| GatewayError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| GatewayError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TaskService for GatewayClient {
    async fn fetch_statuses(&self, ctx: &BoardContext) -> Result<Vec<ReferenceItem>, GatewayError> {
        let url = self.endpoints.statuses_url();
        debug!(%url, workspace_id = ctx.workspace_id, "fetching task statuses");
        let request = self
            .http
            .get(&url)
            .query(&[("referenceType", TASK_STATUS_REFERENCE_TYPE)]);
        self.send(&url, self.authorized(request, ctx)).await
    }

    async fn fetch_status_groups(&self, ctx: &BoardContext) -> Result<Vec<StatusGroup>, GatewayError> {
        let url = self.endpoints.status_groups_url();
        debug!(%url, workspace_id = ctx.workspace_id, "fetching tasks by status");
        let request = self.http.get(&url);
        self.send(&url, self.authorized(request, ctx)).await
    }

    async fn update_task_status(
        &self,
        ctx: &BoardContext,
        task_id: TaskId,
        request: &UpdateStatusRequest,
    ) -> Result<WorkItem, GatewayError> {
        let url = self.endpoints.task_status_url(task_id);
        debug!(%url, task_id, status = %request.status_code, "updating task status");
        let builder = self.http.put(&url).json(request);
        self.send(&url, self.authorized(builder, ctx)).await
    }
}
