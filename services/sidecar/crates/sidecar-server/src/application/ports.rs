//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports nothing from `crate::infra` or `crate::api`.
//!
//! Both ports use `async_trait` rather than native async fns: the dispatcher
//! moves port futures into `tokio::spawn`, which requires them to be `Send`.

use std::process::Output;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

// ── Overlay Network Port ──────────────────────────────────────────────────────

/// The process-wide overlay-network capability.
///
/// Initialized once at startup from a secret; initialization failure is not
/// fatal — executions re-check [`OverlayNetwork::is_ready`] lazily and fail
/// individually while the network stays down.
#[async_trait]
pub trait OverlayNetwork: Send + Sync {
    /// Join the overlay network using `auth_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the network client rejects the key or does not
    /// come up; the sidecar keeps running either way.
    async fn initialize(&self, auth_key: &str) -> Result<()>;

    /// Whether initialization has completed successfully.
    fn is_ready(&self) -> bool;

    /// Open (and immediately drop) a raw TCP connection to `host:port`
    /// through the overlay, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be established in time.
    async fn dial(&self, host: &str, port: u16, timeout: Duration) -> Result<()>;

    /// Run `command` on `target` (`user@host`) over the overlay network's
    /// own remote-shell path. This transport accepts no tuning flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote-shell client cannot be invoked at all;
    /// a remote nonzero exit is reported through the returned [`Output`].
    async fn run_remote_shell(&self, target: &str, command: &str) -> Result<Output>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;

    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds
    /// `timeout`. On timeout, the child process must be killed (not left
    /// orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}
