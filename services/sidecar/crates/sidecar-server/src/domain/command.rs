//! Pure request validation and remote command construction — no I/O, no
//! async.

use nexus_common::ExecutionRequest;

use crate::domain::error::DispatchError;

/// Fixed diagnostic line used when a request carries neither a usable
/// deployment intent nor a raw command by the time the builder runs.
/// Kept as a no-op on the device so the recorded output explains itself.
pub const DIAGNOSTIC_NOOP_COMMAND: &str = "echo 'deployment command not recognized'";

/// Validate a submit request before any record is created.
///
/// A request is acceptable when the device id is non-empty and at least one
/// of the two forms is complete: a non-empty `command` sequence, or both
/// `app_type` and `app_url`.
///
/// # Errors
///
/// Returns [`DispatchError::EmptyDevice`] or [`DispatchError::InvalidRequest`];
/// neither creates an execution record.
pub fn validate_request(req: &ExecutionRequest) -> Result<(), DispatchError> {
    if req.device_id.trim().is_empty() {
        return Err(DispatchError::EmptyDevice);
    }
    if has_deploy_intent(req) || !req.command.is_empty() {
        return Ok(());
    }
    Err(DispatchError::InvalidRequest)
}

/// Translate a request into the single command line run on the device.
///
/// A deployment intent wins over a raw command when both are present: it
/// becomes a two-step line that pulls the referenced image and runs it as a
/// container named `<app_type>-instance` with an always-restart policy. A raw
/// command sequence is joined into one line unchanged. Anything else falls
/// back to [`DIAGNOSTIC_NOOP_COMMAND`].
#[must_use]
pub fn build_command(req: &ExecutionRequest) -> String {
    if has_deploy_intent(req) {
        // has_deploy_intent guarantees both fields are present
        let app_type = req.app_type.as_deref().unwrap_or_default();
        let app_url = req.app_url.as_deref().unwrap_or_default();
        return format!(
            "docker pull {app_url} && docker run -d --name {app_type}-instance --restart=always {app_url}"
        );
    }
    if !req.command.is_empty() {
        return req.command.join(" ");
    }
    DIAGNOSTIC_NOOP_COMMAND.to_string()
}

fn has_deploy_intent(req: &ExecutionRequest) -> bool {
    matches!(
        (req.app_type.as_deref(), req.app_url.as_deref()),
        (Some(t), Some(u)) if !t.is_empty() && !u.is_empty()
    )
}
