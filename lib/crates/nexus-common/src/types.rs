use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a dispatched remote execution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Pending,
    Success,
    Error,
}

/// The tracked outcome of one dispatched execution.
///
/// Created as `Pending` when the dispatcher accepts a request and updated
/// exactly once when the background attempt finishes. Status transitions are
/// monotonic: a terminal record is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl ExecutionRecord {
    /// A freshly accepted execution with no output yet.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            status: ExecutionStatus::Pending,
            output: String::new(),
            error: String::new(),
        }
    }
}

/// Submit-execution request body.
///
/// Carries either a raw `command` sequence or a complete deployment intent
/// (`app_type` + `app_url`). The deployment intent takes precedence when both
/// are present; a request carrying neither is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
}

/// Acknowledgment returned by the submit endpoint before the remote command
/// has run anywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionAccepted {
    pub execution_id: String,
    pub status: String,
    pub message: String,
}

/// Status-query response for one execution id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStatusResponse {
    pub execution_id: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

/// Health/readiness payload for the sidecar itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub tailnet_ready: bool,
    pub message: String,
    pub time: DateTime<Utc>,
}

/// Error body shared by all non-2xx API responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
