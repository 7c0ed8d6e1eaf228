//! Typed error hierarchy for taskboard.
//!
//! Two enums cover the two layers:
//! - `GatewayError`: transport, status and decoding failures talking to the gateway
//! - `BoardError`: board-level failures (loads, rejected moves, missing context)
//!
//! None of these are fatal: a failed load leaves the prior board in place and
//! a failed move is rolled back locally.

use thiserror::Error;

use crate::board::models::{StatusCode, TaskId};

/// Errors from a single gateway request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Gateway returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid gateway URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl GatewayError {
    /// True when the server answered but the body could not be understood.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Errors from board synchronization and move handling.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Failed to load board for workspace {workspace_id}: {source}")]
    Load {
        workspace_id: i64,
        #[source]
        source: GatewayError,
    },

    #[error("Board data for workspace {workspace_id} was malformed: {source}")]
    MalformedResponse {
        workspace_id: i64,
        #[source]
        source: GatewayError,
    },

    #[error("No workspace selected for the board")]
    NoContext,

    #[error("Task {task_id} is not on the board")]
    ItemNotFound { task_id: TaskId },

    #[error("Task {task_id} already has a status change in flight")]
    MoveInFlight { task_id: TaskId },

    #[error("Status '{code}' is not part of the workspace catalog")]
    UnknownStatus { code: StatusCode },

    #[error("Task {task_id} is already in status '{code}'")]
    SameStatus { task_id: TaskId, code: StatusCode },
}

impl BoardError {
    /// Wraps a failed fetch, separating undecodable bodies from other failures.
    pub fn load(workspace_id: i64, source: GatewayError) -> Self {
        if source.is_malformed() {
            Self::MalformedResponse {
                workspace_id,
                source,
            }
        } else {
            Self::Load {
                workspace_id,
                source,
            }
        }
    }
}
