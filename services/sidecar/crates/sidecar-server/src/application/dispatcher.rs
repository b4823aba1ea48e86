//! Execution dispatcher — validates submissions, assigns ids, and fans each
//! accepted request out to one tracked background task.

use std::sync::Arc;

use nexus_common::{ExecutionRecord, ExecutionRequest};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::application::executor::ExecutorChain;
use crate::application::ports::{CommandRunner, OverlayNetwork};
use crate::application::store::ExecutionStore;
use crate::domain::{DispatchError, IdGenerator, build_command, validate_request};

/// Accepts execution requests and returns immediately; the transport chain
/// runs in a background task per dispatch.
///
/// There is no deduplication and no per-device serialization: two dispatches
/// with identical inputs get two ids, two records, and two racing tasks.
pub struct ExecutionDispatcher<N, R> {
    store: ExecutionStore,
    ids: IdGenerator,
    chain: Arc<ExecutorChain<N, R>>,
    // Handles for every spawned execution, so shutdown can drain instead of
    // leaking untracked tasks.
    tasks: Mutex<JoinSet<()>>,
}

impl<N, R> ExecutionDispatcher<N, R>
where
    N: OverlayNetwork + 'static,
    R: CommandRunner + 'static,
{
    /// The record store is injected so callers (and tests) own independent
    /// instances rather than sharing process-wide state.
    #[must_use]
    pub fn new(chain: ExecutorChain<N, R>, store: ExecutionStore) -> Self {
        Self {
            store,
            ids: IdGenerator::new(),
            chain: Arc::new(chain),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Validate `request` and dispatch it, returning the execution id before
    /// the remote command has run anywhere.
    ///
    /// The `Pending` record is written before this returns, so an immediate
    /// status query for the returned id always finds it.
    ///
    /// # Errors
    ///
    /// Returns a validation [`DispatchError`]; no record is created in that
    /// case.
    pub async fn dispatch(&self, request: &ExecutionRequest) -> Result<String, DispatchError> {
        validate_request(request)?;

        let command = build_command(request);
        let device = request.device_id.clone();
        let execution_id = self.ids.allocate(&device);
        self.store.insert_pending(&execution_id).await;

        tracing::info!(execution_id = %execution_id, device = %device, command = %command,
            "execution dispatched");

        let chain = Arc::clone(&self.chain);
        let store = self.store.clone();
        let id = execution_id.clone();
        let mut tasks = self.tasks.lock().await;
        // Reap handles of finished executions before adding another.
        while tasks.try_join_next().is_some() {}
        tasks.spawn(async move {
            let outcome = chain.execute(&id, &device, &command).await;
            store.complete(&id, outcome).await;
        });

        Ok(execution_id)
    }

    /// Snapshot of the record for `execution_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::NotFound`] for unknown ids.
    pub async fn status(&self, execution_id: &str) -> Result<ExecutionRecord, DispatchError> {
        self.store
            .get(execution_id)
            .await
            .ok_or_else(|| DispatchError::NotFound(execution_id.to_string()))
    }

    /// Whether the overlay network capability finished initialization.
    pub fn network_ready(&self) -> bool {
        self.chain.network_ready()
    }

    /// Await every outstanding execution task. Each task is itself bounded
    /// by the per-execution deadline, so this cannot hang indefinitely.
    pub async fn shutdown(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(error) = result {
                tracing::warn!(error = %error, "execution task aborted during shutdown");
            }
        }
    }
}
