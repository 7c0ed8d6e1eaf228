//! In-process stub of the project-management gateway, served with axum on
//! an ephemeral port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{Value, json};

pub const TOKEN: &str = "test-token";

/// A request as the stub saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub workspace_id: Option<String>,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct GatewayState {
    statuses: Value,
    groups: Value,
    fail_updates: bool,
    malformed_groups: bool,
    requests: Vec<Recorded>,
}

#[derive(Debug, Clone)]
pub struct StubGateway {
    state: Arc<Mutex<GatewayState>>,
}

pub fn status(code: &str, description: &str, id: i64) -> Value {
    json!({
        "referenceItemId": id,
        "referenceType": "TASK_STATUS",
        "itemCode": code,
        "description": description,
        "metadata": []
    })
}

pub fn task(id: i64, title: &str, code: &str) -> Value {
    json!({
        "taskId": id,
        "taskName": format!("TSK-{}", id),
        "taskTitle": title,
        "taskStatus": {"itemCode": code, "description": code},
        "assignee": null,
        "tags": [{"tagId": 1, "tagName": "backend"}],
        "createdDate": "2024-05-01T10:00:00"
    })
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl StubGateway {
    /// Catalog TODO, IN_PROGRESS, DONE; tasks 1 and 2 in the TODO group, DONE empty.
    pub fn new() -> Self {
        let state = GatewayState {
            statuses: json!([
                status("TODO", "To do", 1),
                status("IN_PROGRESS", "In progress", 2),
                status("DONE", "Done", 3),
            ]),
            groups: json!([
                {"status": {"itemCode": "TODO", "description": "To do"},
                 "tasks": [task(1, "Write docs", "TODO"), task(2, "Fix login", "TODO")]},
                {"status": {"itemCode": "DONE", "description": "Done"}, "tasks": []}
            ]),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn fail_updates(&self) {
        self.state.lock().unwrap().fail_updates = true;
    }

    pub fn malformed_groups(&self) {
        self.state.lock().unwrap().malformed_groups = true;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Serves the stub and returns its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/reference/references/items", get(statuses))
            .route("/aggregator/tasks/statusGroup", get(groups))
            .route("/tasks/tasks/{id}/status", put(update_status))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn record(
        &self,
        method: &'static str,
        path: String,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        body: Option<Value>,
    ) -> Result<(), StatusCode> {
        let workspace_id = headers
            .get("workspaceId")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.state.lock().unwrap().requests.push(Recorded {
            method,
            path,
            workspace_id,
            query,
            body,
        });
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {}", TOKEN));
        if authorized { Ok(()) } else { Err(StatusCode::UNAUTHORIZED) }
    }
}

async fn statuses(
    State(gw): State<StubGateway>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(code) = gw.record("GET", "/reference/references/items".into(), &headers, query, None) {
        return code.into_response();
    }
    let body = gw.state.lock().unwrap().statuses.clone();
    Json(body).into_response()
}

async fn groups(State(gw): State<StubGateway>, headers: HeaderMap) -> Response {
    if let Err(code) = gw.record("GET", "/aggregator/tasks/statusGroup".into(), &headers, HashMap::new(), None) {
        return code.into_response();
    }
    let state = gw.state.lock().unwrap();
    if state.malformed_groups {
        return (StatusCode::OK, "[{\"status\": ").into_response();
    }
    Json(state.groups.clone()).into_response()
}

async fn update_status(
    State(gw): State<StubGateway>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/tasks/tasks/{}/status", id);
    if let Err(code) = gw.record("PUT", path, &headers, HashMap::new(), Some(body.clone())) {
        return code.into_response();
    }
    if gw.state.lock().unwrap().fail_updates {
        return (StatusCode::INTERNAL_SERVER_ERROR, "update failed").into_response();
    }
    let code = body["statusCode"].as_str().unwrap_or("UNKNOWN").to_string();
    let mut updated = task(id, "Updated", &code);
    if let Some(assignee) = body.get("assigneeId").and_then(Value::as_i64) {
        updated["assignee"] = json!({
            "memberId": assignee,
            "username": "grace",
            "email": "grace@example.com",
            "firstName": "Grace",
            "lastName": "Hopper"
        });
    }
    Json(updated).into_response()
}
