//! Boolean workspace flag patching (auto-apply, speculative runs)

use crate::error::Result;
use crate::tfe::batch::{self, AttributePatch, BatchResult};
use crate::tfe::workspaces::Workspace;
use crate::tfe::TfeClient;

/// Patch the auto-apply flag of every workspace.
pub async fn patch_auto_apply(
    client: &TfeClient,
    workspaces: &[Workspace],
    enabled: bool,
) -> Result<BatchResult> {
    let patch = AttributePatch::new(
        "auto-apply",
        |ws| ws.auto_apply.to_string(),
        serde_json::json!(enabled),
    );
    batch::patch_workspaces(client, workspaces, &[patch]).await
}

/// Patch the speculative-runs flag of every workspace.
pub async fn patch_speculative(
    client: &TfeClient,
    workspaces: &[Workspace],
    enabled: bool,
) -> Result<BatchResult> {
    let patch = AttributePatch::new(
        "speculative-enabled",
        |ws| ws.speculative.to_string(),
        serde_json::json!(enabled),
    );
    batch::patch_workspaces(client, workspaces, &[patch]).await
}
