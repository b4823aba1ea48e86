//! Concurrent execution-record table backing status polling.

use std::collections::HashMap;
use std::sync::Arc;

use nexus_common::{ExecutionRecord, ExecutionStatus};
use tokio::sync::RwLock;

use crate::application::executor::ExecOutcome;

/// Execution id → record table shared between the dispatcher and its
/// background tasks.
///
/// One lock guards creation, completion, and reads; every critical section
/// is a single in-memory map operation, so the coarse granularity is cheap.
/// All network and process work happens outside the lock, inside the
/// background task. Records are never evicted: unbounded growth under
/// sustained dispatch load is an accepted characteristic of this store (no
/// TTL, no capacity bound, no persistence across restarts).
#[derive(Debug, Clone, Default)]
pub struct ExecutionStore {
    records: Arc<RwLock<HashMap<String, ExecutionRecord>>>,
}

impl ExecutionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the `Pending` record for a freshly validated dispatch.
    pub async fn insert_pending(&self, id: &str) {
        self.records
            .write()
            .await
            .insert(id.to_string(), ExecutionRecord::pending());
    }

    /// Record the terminal outcome of an execution.
    ///
    /// Transitions are monotonic: an id that is already `Success` or `Error`
    /// is left untouched, and a completion for an unknown id is dropped.
    pub async fn complete(&self, id: &str, outcome: ExecOutcome) {
        let mut records = self.records.write().await;
        match records.get_mut(id) {
            Some(record) if record.status == ExecutionStatus::Pending => {
                *record = outcome.into_record();
            }
            Some(record) => {
                tracing::warn!(
                    execution_id = %id,
                    status = ?record.status,
                    "ignoring completion for already-terminal execution"
                );
            }
            None => {
                tracing::warn!(execution_id = %id, "completion for unknown execution id");
            }
        }
    }

    /// Snapshot of one record; `None` for unknown ids.
    pub async fn get(&self, id: &str) -> Option<ExecutionRecord> {
        self.records.read().await.get(id).cloned()
    }

    /// Number of records ever created (records are never evicted).
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
