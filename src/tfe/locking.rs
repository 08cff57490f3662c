//! Workspace locking and unlocking

use crate::config::{api, report};
use crate::tfe::batch::{wrap_text, BatchResult, ReportRow, RowStatus};
use crate::tfe::workspaces::Workspace;
use crate::tfe::TfeClient;

/// Lock or unlock every workspace via the body-less action endpoint.
///
/// 409 means the workspace is already in the requested state; the end state
/// matches intent, so it counts as success and the operation stays
/// idempotent. Failures on one workspace never stop the rest.
pub async fn lock_or_unlock_workspaces(
    client: &TfeClient,
    workspaces: &[Workspace],
    set_lock: bool,
) -> BatchResult {
    let action = if set_lock { "lock" } else { "unlock" };
    let mut rows = Vec::with_capacity(workspaces.len());
    let mut all_successful = true;

    for workspace in workspaces {
        let path = format!("/{}/{}/actions/{}", api::WORKSPACES, workspace.id, action);
        let response = client.post_action(&path).await;

        if response.status == 200 || response.status == 409 {
            rows.push(ReportRow {
                workspace: workspace.name.clone(),
                field: "locked".to_string(),
                before: workspace.is_locked.to_string(),
                after: set_lock.to_string(),
                status: RowStatus::Success,
                message: "none".to_string(),
            });
        } else {
            all_successful = false;
            rows.push(ReportRow {
                workspace: workspace.name.clone(),
                field: "locked".to_string(),
                before: workspace.is_locked.to_string(),
                after: workspace.is_locked.to_string(),
                status: RowStatus::Error,
                message: wrap_text(&response.error_message(), report::MESSAGE_COLUMN_LIMIT),
            });
        }
    }

    BatchResult {
        rows,
        all_successful,
    }
}
