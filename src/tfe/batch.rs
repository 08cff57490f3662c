//! The batch operation executor
//!
//! Every domain operation funnels through here: one PATCH per workspace
//! carrying the desired attribute values, one report row per (workspace,
//! field), with per-item outcomes that never abort the rest of the batch.

use serde_json::Value;

use crate::config::{api, report};
use crate::error::{Result, TfeError};
use crate::tfe::workspaces::Workspace;
use crate::tfe::TfeClient;

/// One attribute mutation: wire name, how to read the current value off a
/// snapshot, and the desired value.
///
/// Keeping these three together in one record (rather than in parallel lists
/// correlated by position) makes a mismatched batch unrepresentable.
pub struct AttributePatch {
    /// Wire name of the attribute, e.g. `terraform-version`
    pub field: &'static str,
    /// Reads the attribute's current value off a workspace snapshot, already
    /// rendered for the report
    pub current: fn(&Workspace) -> String,
    /// Desired value sent in the PATCH body
    pub value: Value,
    /// Report rendering of the desired value
    desired_display: String,
}

impl AttributePatch {
    pub fn new(field: &'static str, current: fn(&Workspace) -> String, value: Value) -> Self {
        let desired_display = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            field,
            current,
            value,
            desired_display,
        }
    }

    /// Override the report rendering of the desired value (e.g. `<none>` for
    /// an empty working directory, while the wire value stays `""`).
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.desired_display = display.into();
        self
    }

    pub fn desired_display(&self) -> &str {
        &self.desired_display
    }
}

/// Per-row outcome marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RowStatus {
    Error,
    Success,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStatus::Success => write!(f, "success"),
            RowStatus::Error => write!(f, "error"),
        }
    }
}

/// One line of the batch report
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub workspace: String,
    pub field: String,
    pub before: String,
    pub after: String,
    pub status: RowStatus,
    pub message: String,
}

/// Aggregated outcome of a batch operation
#[derive(Debug)]
pub struct BatchResult {
    pub rows: Vec<ReportRow>,
    pub all_successful: bool,
}

impl BatchResult {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            all_successful: true,
        }
    }
}

/// Apply the given attribute patches to every workspace, one PATCH each.
///
/// All fields are merged into a single request body per workspace, so a
/// multi-field batch is atomic per workspace. A failure on one workspace
/// never stops the remaining ones; `all_successful` is true only when every
/// workspace succeeded. Patching an attribute to its current value is a
/// success with the "unchanged" message, which is what makes every batch
/// operation idempotent.
pub async fn patch_workspaces(
    client: &TfeClient,
    workspaces: &[Workspace],
    patches: &[AttributePatch],
) -> Result<BatchResult> {
    if patches.is_empty() {
        return Err(TfeError::Config(
            "a batch operation requires at least one attribute patch".to_string(),
        ));
    }

    let mut attributes = serde_json::Map::new();
    for patch in patches {
        attributes.insert(patch.field.to_string(), patch.value.clone());
    }
    let body = serde_json::json!({
        "data": {"type": "workspaces", "attributes": attributes}
    });

    let mut rows = Vec::with_capacity(workspaces.len() * patches.len());
    let mut all_successful = true;

    for workspace in workspaces {
        let path = format!("/{}/{}", api::WORKSPACES, workspace.id);
        let response = client.patch(&path, &body).await;

        if response.status == 200 {
            for patch in patches {
                let before = (patch.current)(workspace);
                let after = patch.desired_display().to_string();
                let message = if before == after {
                    format!("{} unchanged", patch.field)
                } else {
                    "none".to_string()
                };
                rows.push(ReportRow {
                    workspace: workspace.name.clone(),
                    field: patch.field.to_string(),
                    before,
                    after,
                    status: RowStatus::Success,
                    message,
                });
            }
        } else {
            all_successful = false;
            let message = wrap_text(&response.error_message(), report::MESSAGE_COLUMN_LIMIT);
            for patch in patches {
                let before = (patch.current)(workspace);
                rows.push(ReportRow {
                    workspace: workspace.name.clone(),
                    field: patch.field.to_string(),
                    before: before.clone(),
                    after: before,
                    status: RowStatus::Error,
                    message: message.clone(),
                });
            }
        }
    }

    Ok(BatchResult {
        rows,
        all_successful,
    })
}

/// Word-wrap a message for the report's message column, never breaking words.
pub(crate) fn wrap_text(text: &str, column_limit: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= column_limit {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}
