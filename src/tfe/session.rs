//! One invocation's Terraform context
//!
//! Holds the resolved token, target domain and organization, and the
//! workspace selection criteria, plus the in-run workspace cache. Everything
//! that used to be ambient (token lookups, fetched workspace lists) lives in
//! this explicitly-constructed value with a lifetime of one program run.

use tokio::sync::OnceCell;

use crate::error::{Result, TfeError};
use crate::tfe::batch::BatchResult;
use crate::tfe::execution_modes::{self, ExecutionMode};
use crate::tfe::variables::{self, Variable, VariableReport};
use crate::tfe::versions::{self, TerraformVersion};
use crate::tfe::workspaces::{self, Workspace, WorkspaceFilter};
use crate::tfe::{flags, locking, working_directories, TfeClient};

/// Selection criteria and connection settings for one run
pub struct Terraform {
    client: TfeClient,
    organization: String,
    workspace_cache: OnceCell<Vec<Workspace>>,
    filter: WorkspaceFilter,
}

impl Terraform {
    /// Build a context; rejects invalid selection criteria (a blacklist with
    /// no name patterns) before anything touches the network.
    pub fn new(
        host: &str,
        organization: &str,
        token: String,
        no_tls: bool,
        workspace_patterns: Option<&[String]>,
        blacklist: bool,
    ) -> Result<Self> {
        let filter = WorkspaceFilter::new(workspace_patterns, blacklist)?;
        Ok(Self {
            client: TfeClient::new(token, host.to_string(), no_tls),
            organization: organization.to_string(),
            workspace_cache: OnceCell::new(),
            filter,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_client(client: TfeClient, organization: &str) -> Self {
        Self {
            client,
            organization: organization.to_string(),
            workspace_cache: OnceCell::new(),
            filter: WorkspaceFilter::all(),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn host(&self) -> &str {
        self.client.host()
    }

    /// The selected workspaces, fetched once and cached for the rest of the
    /// run. Mutating operations act on this snapshot; re-running the program
    /// observes the new server state.
    pub async fn workspaces(&self) -> Result<&[Workspace]> {
        let workspaces = self
            .workspace_cache
            .get_or_try_init(|| workspaces::fetch_all(&self.client, &self.organization, &self.filter))
            .await?;
        Ok(workspaces)
    }

    /// Lock or unlock the selected workspaces.
    pub async fn lock_workspaces(&self, set_lock: bool) -> Result<BatchResult> {
        let workspaces = self.workspaces().await?;
        Ok(locking::lock_or_unlock_workspaces(&self.client, workspaces, set_lock).await)
    }

    /// Patch the Terraform version of the selected workspaces, refusing the
    /// whole batch if any workspace would be downgraded.
    pub async fn set_versions(&self, new_version: &str) -> Result<BatchResult> {
        let desired = TerraformVersion::parse(new_version).ok_or_else(|| {
            TfeError::Config(format!(
                "the version you specified ({}) is not valid",
                new_version
            ))
        })?;
        let workspaces = self.workspaces().await?;
        versions::patch_versions(&self.client, workspaces, &desired).await
    }

    /// Tabulatable summary input: workspaces grouped by version.
    pub async fn version_groups(
        &self,
    ) -> Result<std::collections::BTreeMap<String, Vec<&Workspace>>> {
        let workspaces = self.workspaces().await?;
        Ok(versions::group_by_version(workspaces))
    }

    /// Patch the working directory of the selected workspaces.
    pub async fn set_working_directories(&self, directory: Option<&str>) -> Result<BatchResult> {
        let workspaces = self.workspaces().await?;
        working_directories::patch_working_directories(&self.client, workspaces, directory).await
    }

    /// Patch the execution mode of the selected workspaces.
    pub async fn set_execution_modes(
        &self,
        mode: &str,
        agent_pool_id: Option<&str>,
    ) -> Result<BatchResult> {
        let mode: ExecutionMode = mode.parse()?;
        let workspaces = self.workspaces().await?;
        execution_modes::patch_execution_modes(&self.client, workspaces, mode, agent_pool_id).await
    }

    /// Patch the auto-apply flag of the selected workspaces.
    pub async fn set_auto_apply(&self, enabled: bool) -> Result<BatchResult> {
        let workspaces = self.workspaces().await?;
        flags::patch_auto_apply(&self.client, workspaces, enabled).await
    }

    /// Patch the speculative-runs flag of the selected workspaces.
    pub async fn set_speculative(&self, enabled: bool) -> Result<BatchResult> {
        let workspaces = self.workspaces().await?;
        flags::patch_speculative(&self.client, workspaces, enabled).await
    }

    /// Create or update variables across the selected workspaces.
    ///
    /// An empty variable set is a precondition failure: it would be a silent
    /// no-op, which is never what the operator meant.
    pub async fn configure_variables(&self, variables: &[Variable]) -> Result<VariableReport> {
        if variables.is_empty() {
            return Err(TfeError::Precondition(
                "no variable definitions were provided".to_string(),
            ));
        }
        let workspaces = self.workspaces().await?;
        Ok(variables::configure_variables(&self.client, workspaces, variables).await)
    }

    /// Delete variables by key across the selected workspaces.
    pub async fn delete_variables(&self, keys: &[String]) -> Result<VariableReport> {
        let workspaces = self.workspaces().await?;
        Ok(variables::delete_variables(&self.client, workspaces, keys).await)
    }
}
