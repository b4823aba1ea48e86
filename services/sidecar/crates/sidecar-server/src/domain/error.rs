//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to
//! `anyhow::Error` via the `?` operator.

use thiserror::Error;

// ── Dispatch errors ───────────────────────────────────────────────────────────

/// Errors surfaced synchronously by the dispatcher. A validation error means
/// no execution record was created for the request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("device_id is required")]
    EmptyDevice,

    #[error("either (app_type + app_url) or a non-empty command is required")]
    InvalidRequest,

    #[error("execution {0} not found")]
    NotFound(String),
}

// ── Execution failure classification ──────────────────────────────────────────

/// Why a background execution attempt ended in an `Error` record.
///
/// None of these are fatal to the sidecar; the worst case is an `Error`
/// record for that one execution.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum FailureKind {
    /// The overlay network never finished initializing; re-checked lazily on
    /// every execution attempt.
    #[error("overlay network not initialized")]
    NetworkUninitialized,

    /// The primary and/or secondary transport returned a transport-level
    /// error or a nonzero exit.
    #[error("remote execution failed")]
    ExecutionFailure,

    /// The overall per-execution deadline elapsed before any attempt
    /// produced a result.
    #[error("execution deadline exceeded")]
    DeadlineExceeded,
}
