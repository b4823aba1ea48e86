//! Tailnet infrastructure — implements `OverlayNetwork` over the `tailscale`
//! CLI and the kernel tailnet interface.

use std::process::Output;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::ports::{CommandRunner, OverlayNetwork};

/// Bound on `tailscale up` during initialization.
const UP_TIMEOUT: Duration = Duration::from_secs(30);

/// Local bound on one `tailscale ssh` invocation; the executor chain applies
/// the tighter per-execution deadline on top.
const REMOTE_SHELL_TIMEOUT: Duration = Duration::from_secs(60);

/// Production overlay-network capability backed by a local `tailscale`
/// daemon.
///
/// Readiness is a flag set once `tailscale up` has accepted the auth key;
/// it starts false and stays false if initialization never succeeds, which
/// fails individual executions rather than the process.
pub struct TailscaleCli<R> {
    runner: Arc<R>,
    ready: AtomicBool,
}

impl<R> TailscaleCli<R> {
    #[must_use]
    pub fn new(runner: Arc<R>) -> Self {
        Self {
            runner,
            ready: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<R> OverlayNetwork for TailscaleCli<R>
where
    R: CommandRunner,
{
    async fn initialize(&self, auth_key: &str) -> Result<()> {
        let key_arg = format!("--authkey={auth_key}");
        let output = self
            .runner
            .run_with_timeout("tailscale", &["up", key_arg.as_str()], UP_TIMEOUT)
            .await
            .context("failed to run tailscale up")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tailscale up failed: {}", stderr.trim());
        }

        self.ready.store(true, Ordering::Release);
        tracing::info!("tailnet initialized");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn dial(&self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        // The tailnet interface routes this like any other TCP connect.
        let stream = tokio::time::timeout(timeout, tokio::net::TcpStream::connect((host, port)))
            .await
            .with_context(|| format!("dialing {host}:{port} timed out"))?
            .with_context(|| format!("dialing {host}:{port} failed"))?;
        drop(stream);
        Ok(())
    }

    async fn run_remote_shell(&self, target: &str, command: &str) -> Result<Output> {
        // The native client takes no tuning flags — target and command only.
        self.runner
            .run_with_timeout("tailscale", &["ssh", target, command], REMOTE_SHELL_TIMEOUT)
            .await
            .context("failed to run tailscale ssh")
    }
}
