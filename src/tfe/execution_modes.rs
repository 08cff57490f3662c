//! Workspace execution mode patching

use std::fmt;
use std::str::FromStr;

use crate::config::defaults;
use crate::error::{Result, TfeError};
use crate::tfe::batch::{self, AttributePatch, BatchResult};
use crate::tfe::workspaces::Workspace;
use crate::tfe::TfeClient;

/// Where a workspace's runs execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Remote,
    Local,
    Agent,
}

impl FromStr for ExecutionMode {
    type Err = TfeError;

    /// Case-sensitive: the API only accepts the exact lowercase names.
    fn from_str(value: &str) -> Result<Self> {
        match value {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            "agent" => Ok(Self::Agent),
            other => Err(TfeError::Config(format!(
                "invalid execution mode '{}': must be one of remote, local, agent",
                other
            ))),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Local => write!(f, "local"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// Validate the desired mode/pool-id/host combination.
///
/// Runs before any HTTP request: a bad combination aborts the whole operation
/// with zero side effects. Agent pools only exist on the cloud-hosted
/// offering, so `agent` mode against a self-hosted Enterprise domain is
/// rejected outright.
fn validate(mode: ExecutionMode, agent_pool_id: Option<&str>, host: &str) -> Result<()> {
    match mode {
        ExecutionMode::Agent => {
            if agent_pool_id.is_none() {
                return Err(TfeError::Config(
                    "execution mode 'agent' requires --agent-pool-id".to_string(),
                ));
            }
            if host != defaults::HOST {
                return Err(TfeError::Config(format!(
                    "execution mode 'agent' is only supported on {} (agent pools \
                     are not available on self-hosted Terraform Enterprise)",
                    defaults::HOST
                )));
            }
        }
        _ => {
            if agent_pool_id.is_some() {
                return Err(TfeError::Config(format!(
                    "--agent-pool-id is only valid with execution mode 'agent', not '{}'",
                    mode
                )));
            }
        }
    }
    Ok(())
}

fn current_pool_display(workspace: &Workspace) -> String {
    workspace
        .agent_pool_id
        .clone()
        .unwrap_or_else(|| "<none>".to_string())
}

/// Patch the execution mode of every workspace.
///
/// For `agent` mode the agent pool id rides along in the same PATCH, so each
/// workspace still sees exactly one request.
pub async fn patch_execution_modes(
    client: &TfeClient,
    workspaces: &[Workspace],
    new_mode: ExecutionMode,
    agent_pool_id: Option<&str>,
) -> Result<BatchResult> {
    validate(new_mode, agent_pool_id, client.host())?;

    let mut patches = vec![AttributePatch::new(
        "execution-mode",
        |ws| ws.execution_mode.clone(),
        serde_json::json!(new_mode.to_string()),
    )];
    if let Some(pool_id) = agent_pool_id {
        patches.push(AttributePatch::new(
            "agent-pool-id",
            current_pool_display,
            serde_json::json!(pool_id),
        ));
    }

    batch::patch_workspaces(client, workspaces, &patches).await
}
