//! Remote executor chain — probe, primary ssh transport, overlay-native
//! fallback.
//!
//! One execution walks `NotStarted → ProbeAttempted → PrimaryAttempted →
//! {Success | FallbackAttempted} → {Success | Failed}`, strictly sequential,
//! with every sub-step bounded by one shared per-execution deadline.

use std::process::{ExitStatus, Output};
use std::sync::Arc;
use std::time::Duration;

use nexus_common::{ExecutionRecord, ExecutionStatus};
use tokio::time::Instant;

use crate::application::ports::{CommandRunner, OverlayNetwork};
use crate::domain::FailureKind;

/// Default error-text signature of an overlay access-policy rejection of the
/// primary transport. Matching output means the network reached the device
/// but its policy refused conventional ssh, so the overlay-native shell may
/// still be permitted.
pub const POLICY_DENIAL_PATTERN: &str = "policy does not permit";

/// Default policy-denial classifier; see [`POLICY_DENIAL_PATTERN`].
#[must_use]
pub fn is_policy_denial(output: &str) -> bool {
    output.contains(POLICY_DENIAL_PATTERN)
}

/// Pluggable classification of primary-transport output as a policy denial.
pub type DenialClassifier = Arc<dyn Fn(&str) -> bool + Send + Sync>;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tuning knobs for one executor chain; the defaults match production.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Remote user for both transports.
    pub ssh_user: String,
    /// Shared deadline covering probe, primary, and fallback together.
    pub overall_deadline: Duration,
    /// Bound on the connectivity probe alone.
    pub probe_timeout: Duration,
    /// Port probed for transport-level reachability.
    pub probe_port: u16,
    /// `ssh -o ConnectTimeout` value, seconds.
    pub connect_timeout_secs: u32,
    /// `ssh -o ServerAliveInterval` value, seconds.
    pub keepalive_interval_secs: u32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            ssh_user: "root".to_string(),
            overall_deadline: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(20),
            probe_port: 22,
            connect_timeout_secs: 25,
            keepalive_interval_secs: 10,
        }
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Terminal result of one execution attempt, recorded into the store.
#[derive(Debug, Clone)]
pub enum ExecOutcome {
    Success {
        output: String,
    },
    Failed {
        kind: FailureKind,
        output: String,
        detail: String,
    },
}

impl ExecOutcome {
    #[must_use]
    pub fn success(output: String) -> Self {
        Self::Success { output }
    }

    #[must_use]
    pub fn failed(kind: FailureKind, output: String, detail: String) -> Self {
        Self::Failed {
            kind,
            output,
            detail,
        }
    }

    /// Fold the outcome into the record shape callers poll for.
    #[must_use]
    pub fn into_record(self) -> ExecutionRecord {
        match self {
            Self::Success { output } => ExecutionRecord {
                status: ExecutionStatus::Success,
                output,
                error: String::new(),
            },
            Self::Failed {
                kind,
                output,
                detail,
            } => ExecutionRecord {
                status: ExecutionStatus::Error,
                output,
                error: if detail.is_empty() {
                    kind.to_string()
                } else {
                    format!("{kind}: {detail}")
                },
            },
        }
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// Ordered transport attempt for one execution: readiness check, best-effort
/// probe, primary `ssh`, and at most one overlay-native fallback when the
/// primary output matches the denial classifier.
pub struct ExecutorChain<N, R> {
    network: Arc<N>,
    runner: Arc<R>,
    config: ExecutorConfig,
    classify_denial: DenialClassifier,
}

impl<N, R> ExecutorChain<N, R>
where
    N: OverlayNetwork,
    R: CommandRunner,
{
    #[must_use]
    pub fn new(network: Arc<N>, runner: Arc<R>, config: ExecutorConfig) -> Self {
        Self {
            network,
            runner,
            config,
            classify_denial: Arc::new(|output: &str| is_policy_denial(output)),
        }
    }

    /// Replace the policy-denial classifier.
    #[must_use]
    pub fn with_denial_classifier(mut self, classify: DenialClassifier) -> Self {
        self.classify_denial = classify;
        self
    }

    pub fn network_ready(&self) -> bool {
        self.network.is_ready()
    }

    /// Run `command` on `device`, returning the terminal outcome.
    ///
    /// Never panics and never blocks past the overall deadline plus
    /// scheduling slack; every failure mode folds into a `Failed` outcome.
    pub async fn execute(&self, execution_id: &str, device: &str, command: &str) -> ExecOutcome {
        let deadline = Instant::now() + self.config.overall_deadline;

        // Readiness is re-checked lazily per execution; a network that never
        // came up fails this execution only.
        if !self.network.is_ready() {
            tracing::warn!(execution_id = %execution_id, device = %device,
                "overlay network not ready; failing execution");
            return ExecOutcome::failed(
                FailureKind::NetworkUninitialized,
                String::new(),
                String::new(),
            );
        }

        let reachable = self.probe(execution_id, device, deadline).await;
        tracing::debug!(execution_id = %execution_id, device = %device, reachable,
            "connectivity probe finished");

        let target = format!("{}@{}", self.config.ssh_user, device);
        self.primary(execution_id, &target, command, deadline).await
    }

    /// Transport-level reachability check. Diagnostic only: the result is
    /// logged and never gates the execution, because overlay reachability
    /// semantics (NAT traversal, lazy peer discovery) produce false
    /// negatives. Any failure reads as unreachable; nothing propagates.
    async fn probe(&self, execution_id: &str, device: &str, deadline: Instant) -> bool {
        let Some(remaining) = remaining_until(deadline) else {
            return false;
        };
        let window = remaining.min(self.config.probe_timeout);
        let attempt = self.network.dial(device, self.config.probe_port, window);
        match tokio::time::timeout(window, attempt).await {
            Ok(Ok(())) => true,
            Ok(Err(error)) => {
                tracing::info!(execution_id = %execution_id, device = %device,
                    error = %error, "connectivity probe failed; attempting execution anyway");
                false
            }
            Err(_) => {
                tracing::info!(execution_id = %execution_id, device = %device,
                    "connectivity probe timed out; attempting execution anyway");
                false
            }
        }
    }

    async fn primary(
        &self,
        execution_id: &str,
        target: &str,
        command: &str,
        deadline: Instant,
    ) -> ExecOutcome {
        let Some(remaining) = remaining_until(deadline) else {
            return self.deadline_exceeded("primary transport never started");
        };

        // Host identity is already established by the overlay layer, so host
        // key checking is relaxed here.
        let connect = format!("ConnectTimeout={}", self.config.connect_timeout_secs);
        let keepalive = format!("ServerAliveInterval={}", self.config.keepalive_interval_secs);
        let args = [
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "UserKnownHostsFile=/dev/null",
            "-o",
            connect.as_str(),
            "-o",
            keepalive.as_str(),
            "-o",
            "BatchMode=yes",
            target,
            command,
        ];

        tracing::info!(execution_id = %execution_id, target = %target, "attempting primary ssh transport");
        let attempt = self.runner.run_with_timeout("ssh", &args, remaining);
        match tokio::time::timeout(remaining, attempt).await {
            Err(_) => self.deadline_exceeded("primary transport exceeded the execution deadline"),
            Ok(Err(error)) => {
                if remaining_until(deadline).is_none() {
                    return self.deadline_exceeded("primary transport exceeded the execution deadline");
                }
                ExecOutcome::failed(
                    FailureKind::ExecutionFailure,
                    String::new(),
                    format!("primary transport: {error:#}"),
                )
            }
            Ok(Ok(output)) if output.status.success() => {
                tracing::info!(execution_id = %execution_id, "primary ssh transport succeeded");
                ExecOutcome::success(combined_output(&output))
            }
            Ok(Ok(output)) => {
                let combined = combined_output(&output);
                if (self.classify_denial)(&combined) {
                    tracing::info!(execution_id = %execution_id,
                        "primary transport blocked by overlay policy; trying native remote shell");
                    self.fallback(execution_id, target, command, deadline).await
                } else {
                    ExecOutcome::failed(
                        FailureKind::ExecutionFailure,
                        combined,
                        exit_detail("ssh", output.status),
                    )
                }
            }
        }
    }

    /// Secondary transport — the overlay network's own remote shell,
    /// attempted at most once and only on a policy denial. It routes around
    /// policy-only rejections, not transport unreachability.
    async fn fallback(
        &self,
        execution_id: &str,
        target: &str,
        command: &str,
        deadline: Instant,
    ) -> ExecOutcome {
        let Some(remaining) = remaining_until(deadline) else {
            return self.deadline_exceeded("secondary transport never started");
        };

        let attempt = self.network.run_remote_shell(target, command);
        match tokio::time::timeout(remaining, attempt).await {
            Err(_) => self.deadline_exceeded("secondary transport exceeded the execution deadline"),
            Ok(Err(error)) => ExecOutcome::failed(
                FailureKind::ExecutionFailure,
                String::new(),
                format!("secondary transport: {error:#}"),
            ),
            Ok(Ok(output)) if output.status.success() => {
                tracing::info!(execution_id = %execution_id, "secondary transport succeeded");
                ExecOutcome::success(combined_output(&output))
            }
            Ok(Ok(output)) => ExecOutcome::failed(
                FailureKind::ExecutionFailure,
                combined_output(&output),
                exit_detail("remote shell", output.status),
            ),
        }
    }

    fn deadline_exceeded(&self, detail: &str) -> ExecOutcome {
        ExecOutcome::failed(
            FailureKind::DeadlineExceeded,
            String::new(),
            format!(
                "{detail} ({}s)",
                self.config.overall_deadline.as_secs()
            ),
        )
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn remaining_until(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    if now < deadline { Some(deadline - now) } else { None }
}

/// Interleaving is lost, matching what a combined-stream capture would see.
fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

fn exit_detail(program: &str, status: ExitStatus) -> String {
    status.code().map_or_else(
        || format!("{program} terminated by signal"),
        |code| format!("{program} exited with status {code}"),
    )
}
