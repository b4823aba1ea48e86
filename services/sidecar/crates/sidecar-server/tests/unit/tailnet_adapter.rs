//! Tailscale CLI adapter — initialization gate, probe dialing, and the
//! native remote-shell invocation.

#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use nexus_sidecar::application::ports::OverlayNetwork;
use nexus_sidecar::infra::TailscaleCli;

use crate::mocks::{ScriptedRunner, err_output, ok_output};

#[tokio::test]
async fn successful_up_marks_the_tailnet_ready() {
    let runner = Arc::new(ScriptedRunner::replying(vec![Ok(ok_output(b""))]));
    let tailnet = TailscaleCli::new(Arc::clone(&runner));

    assert!(!tailnet.is_ready());
    tailnet.initialize("tskey-test").await.expect("up succeeds");
    assert!(tailnet.is_ready());

    let calls = runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "tailscale");
    assert_eq!(calls[0].1, vec!["up", "--authkey=tskey-test"]);
}

#[tokio::test]
async fn failed_up_leaves_the_tailnet_uninitialized() {
    let runner = Arc::new(ScriptedRunner::replying(vec![Ok(err_output(
        b"invalid key: expired",
    ))]));
    let tailnet = TailscaleCli::new(Arc::clone(&runner));

    let error = tailnet
        .initialize("tskey-expired")
        .await
        .expect_err("up fails");
    assert!(error.to_string().contains("invalid key"));
    assert!(!tailnet.is_ready());
}

#[tokio::test]
async fn remote_shell_invokes_tailscale_ssh_with_target_and_command() {
    let runner = Arc::new(ScriptedRunner::replying(vec![
        Ok(ok_output(b"")),
        Ok(ok_output(b"remote ok\n")),
    ]));
    let tailnet = TailscaleCli::new(Arc::clone(&runner));
    tailnet.initialize("tskey-test").await.expect("up succeeds");

    let output = tailnet
        .run_remote_shell("root@edge-cam-1", "uptime")
        .await
        .expect("shell runs");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "remote ok\n");

    let calls = runner.calls();
    assert_eq!(calls[1].0, "tailscale");
    assert_eq!(calls[1].1, vec!["ssh", "root@edge-cam-1", "uptime"]);
}

#[tokio::test]
async fn dial_reaches_a_listening_socket() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().expect("addr").port();
    let tailnet = TailscaleCli::new(Arc::new(ScriptedRunner::replying(vec![])));

    tailnet
        .dial("127.0.0.1", port, Duration::from_secs(1))
        .await
        .expect("dial succeeds");
}

#[tokio::test]
async fn dial_to_a_closed_port_reports_an_error() {
    // Bind then drop to find a port that is almost certainly closed.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let tailnet = TailscaleCli::new(Arc::new(ScriptedRunner::replying(vec![])));
    let result = tailnet.dial("127.0.0.1", port, Duration::from_secs(1)).await;
    assert!(result.is_err());
}
