use std::fmt;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Numeric task identifier, unique within a workspace.
pub type TaskId = i64;

/// Opaque reference-item code (e.g. `TODO`, `IN_PROGRESS`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemCode(String);

/// Status identifiers are reference items of type `TASK_STATUS`.
pub type StatusCode = ItemCode;

impl ItemCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ItemCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl From<String> for ItemCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// The gateway sends `null` for absent collections and strings as often as
/// it omits the key; both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Workspace-scoped metadata attached to a reference item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceMetadata {
    #[serde(default)]
    pub metamodel_id: Option<i64>,
    #[serde(default)]
    pub reference_type_id: Option<i64>,
    #[serde(default)]
    pub workspace_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A reference item as served by the reference service. Task statuses,
/// priorities and types all share this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceItem {
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_item_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_type: String,
    pub item_code: ItemCode,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: Vec<ReferenceMetadata>,
}

impl ReferenceItem {
    /// Minimal reference item carrying only a code and description.
    pub fn new(code: impl Into<ItemCode>, description: impl Into<String>) -> Self {
        Self {
            reference_item_id: 0,
            reference_type: String::new(),
            item_code: code.into(),
            description: description.into(),
            metadata: Vec::new(),
        }
    }

    pub fn code(&self) -> &ItemCode {
        &self.item_code
    }

    /// Looks up a metadata entry by name (case-insensitive).
    pub fn metadata_named(&self, name: &str) -> Option<&ReferenceMetadata> {
        self.metadata
            .iter()
            .find(|m| m.metadata_name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub member_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Member {
    /// Full display name, or `None` when either part is missing.
    pub fn display_name(&self) -> Option<String> {
        if self.first_name.is_empty() || self.last_name.is_empty() {
            return None;
        }
        Some(format!("{} {}", self.first_name, self.last_name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tag_id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_name: String,
}

/// A task card on the board.
///
/// `status` must always match the group the item sits in; the store keeps
/// the two in sync on every mutation. A missing or `null` status decodes to
/// an empty code and is rewritten to the enclosing group's status on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub task_id: TaskId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "taskStatus", default, deserialize_with = "null_as_default")]
    pub status: ReferenceItem,
    #[serde(default)]
    pub task_priority: Option<ReferenceItem>,
    #[serde(default)]
    pub task_type: Option<ReferenceItem>,
    #[serde(default)]
    pub owner: Option<Member>,
    #[serde(default)]
    pub assignee: Option<Member>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub last_modified_date: Option<String>,
}

impl WorkItem {
    pub fn new(task_id: TaskId, title: impl Into<String>, status: ReferenceItem) -> Self {
        Self {
            task_id,
            task_name: String::new(),
            task_title: title.into(),
            description: None,
            status,
            task_priority: None,
            task_type: None,
            owner: None,
            assignee: None,
            tags: Vec::new(),
            created_date: None,
            last_modified_date: None,
        }
    }

    pub fn status_code(&self) -> &StatusCode {
        &self.status.item_code
    }

    pub fn assignee_name(&self) -> String {
        self.assignee
            .as_ref()
            .and_then(Member::display_name)
            .unwrap_or_else(|| "Unassigned".to_string())
    }

    /// Creation time, accepting both offset-qualified and naive timestamps.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        self.created_date.as_deref().and_then(parse_timestamp)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// One board column: a status and its ordered items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusGroup {
    pub status: ReferenceItem,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tasks: Vec<WorkItem>,
}

impl StatusGroup {
    pub fn new(status: ReferenceItem) -> Self {
        Self {
            status,
            tasks: Vec::new(),
        }
    }

    pub fn code(&self) -> &StatusCode {
        &self.status.item_code
    }

    pub fn position_of(&self, task_id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.task_id == task_id)
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.task_id).collect()
    }
}

/// Body of `PUT /tasks/{taskId}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status_code: StatusCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
}

/// Bearer credential for the gateway. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// The (workspace, credential) pair every request and fetch cycle is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardContext {
    pub workspace_id: i64,
    pub credential: Credential,
}

impl BoardContext {
    pub fn new(workspace_id: i64, credential: Credential) -> Self {
        Self {
            workspace_id,
            credential,
        }
    }
}
