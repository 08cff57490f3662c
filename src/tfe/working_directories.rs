//! Workspace working directory patching

use crate::error::Result;
use crate::tfe::batch::{self, AttributePatch, BatchResult};
use crate::tfe::workspaces::Workspace;
use crate::tfe::TfeClient;

/// Sentinel rendered in reports for an unset working directory
const NONE_DISPLAY: &str = "<none>";

fn coalesce(directory: &str) -> String {
    if directory.is_empty() {
        NONE_DISPLAY.to_string()
    } else {
        directory.to_string()
    }
}

/// Patch the working directory of every workspace.
///
/// `None` clears the directory. Empty and unset are the same state for
/// reporting purposes (both show `<none>`), while the wire value is always a
/// string (empty string to clear).
pub async fn patch_working_directories(
    client: &TfeClient,
    workspaces: &[Workspace],
    new_working_directory: Option<&str>,
) -> Result<BatchResult> {
    let wire_value = new_working_directory.unwrap_or_default();
    let patch = AttributePatch::new(
        "working-directory",
        |ws| coalesce(&ws.working_directory),
        serde_json::json!(wire_value),
    )
    .with_display(coalesce(wire_value));

    batch::patch_workspaces(client, workspaces, &[patch]).await
}
