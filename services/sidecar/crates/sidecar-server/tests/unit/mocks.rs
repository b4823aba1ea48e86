//! Shared mock infrastructure for unit tests.
//!
//! Provides canned [`OverlayNetwork`] and [`CommandRunner`] implementations
//! and output helpers so each test file doesn't have to re-define the same
//! boilerplate.

#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use nexus_sidecar::application::ports::{CommandRunner, OverlayNetwork};

// ── Output helpers ────────────────────────────────────────────────────────────

pub fn ok_output(stdout: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(0),
        stdout: stdout.to_vec(),
        stderr: Vec::new(),
    }
}

pub fn err_output(stderr: &[u8]) -> Output {
    Output {
        status: ExitStatus::from_raw(1 << 8),
        stdout: Vec::new(),
        stderr: stderr.to_vec(),
    }
}

fn unexpected<T>() -> Result<T> {
    anyhow::bail!("not expected in this test")
}

// ── Mock overlay network ──────────────────────────────────────────────────────

/// Canned [`OverlayNetwork`] with scripted remote-shell replies and a call
/// recorder for asserting how often the fallback transport ran.
pub struct MockNetwork {
    ready: bool,
    dial_ok: bool,
    shell_replies: Mutex<VecDeque<Result<Output>>>,
    shell_calls: Mutex<Vec<(String, String)>>,
}

impl MockNetwork {
    /// Initialized network; dials succeed.
    pub fn ready() -> Self {
        Self {
            ready: true,
            dial_ok: true,
            shell_replies: Mutex::new(VecDeque::new()),
            shell_calls: Mutex::new(Vec::new()),
        }
    }

    /// Initialization never happened.
    pub fn uninitialized() -> Self {
        Self {
            ready: false,
            ..Self::ready()
        }
    }

    /// Initialized, but the probe target is unreachable.
    pub fn unreachable() -> Self {
        Self {
            dial_ok: false,
            ..Self::ready()
        }
    }

    pub fn with_shell_reply(self, reply: Result<Output>) -> Self {
        self.shell_replies.lock().expect("lock").push_back(reply);
        self
    }

    pub fn shell_calls(&self) -> Vec<(String, String)> {
        self.shell_calls.lock().expect("lock").clone()
    }
}

#[async_trait]
impl OverlayNetwork for MockNetwork {
    async fn initialize(&self, _auth_key: &str) -> Result<()> {
        unexpected()
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn dial(&self, host: &str, _port: u16, _timeout: Duration) -> Result<()> {
        if self.dial_ok {
            Ok(())
        } else {
            anyhow::bail!("no route to {host}")
        }
    }

    async fn run_remote_shell(&self, target: &str, command: &str) -> Result<Output> {
        self.shell_calls
            .lock()
            .expect("lock")
            .push((target.to_string(), command.to_string()));
        self.shell_replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(unexpected)
    }
}

// ── Scripted process runner ───────────────────────────────────────────────────

/// Canned [`CommandRunner`] that replays scripted outputs in order and
/// records every invocation. An optional delay simulates a slow transport.
pub struct ScriptedRunner {
    replies: Mutex<VecDeque<Result<Output>>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    delay: Option<Duration>,
}

impl ScriptedRunner {
    pub fn replying(replies: Vec<Result<Output>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// A transport that never answers within any realistic deadline.
    pub fn hanging() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: Some(Duration::from_secs(3600)),
        }
    }

    /// Delay every reply, keeping executions in flight while tests observe
    /// the pending state.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock").len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(30))
            .await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.calls.lock().expect("lock").push((
            program.to_string(),
            args.iter().map(ToString::to_string).collect(),
        ));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(unexpected)
    }
}
