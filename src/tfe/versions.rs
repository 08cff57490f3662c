//! Terraform version checks and patching

use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::error;
use semver::Version;

use crate::error::{Result, TfeError};
use crate::tfe::batch::{self, AttributePatch, BatchResult};
use crate::tfe::workspaces::Workspace;
use crate::tfe::TfeClient;

/// The string Terraform uses when a workspace is set to auto-update
pub const LATEST_VERSION: &str = "latest";

/// A workspace's Terraform version: either a concrete semantic version or the
/// auto-updating `latest` sentinel.
///
/// `Latest` orders newer than every concrete version and equal only to
/// itself, which is exactly what the downgrade gate needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerraformVersion {
    Latest,
    Exact(Version),
}

impl TerraformVersion {
    /// Parse a version string; `None` when it is neither valid semver nor the
    /// `latest` sentinel.
    pub fn parse(value: &str) -> Option<Self> {
        if value == LATEST_VERSION {
            return Some(Self::Latest);
        }
        Version::parse(value).ok().map(Self::Exact)
    }
}

impl PartialOrd for TerraformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TerraformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Latest, Self::Latest) => Ordering::Equal,
            (Self::Latest, Self::Exact(_)) => Ordering::Greater,
            (Self::Exact(_), Self::Latest) => Ordering::Less,
            (Self::Exact(a), Self::Exact(b)) => a.cmp(b),
        }
    }
}

impl std::fmt::Display for TerraformVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "{}", LATEST_VERSION),
            Self::Exact(v) => write!(f, "{}", v),
        }
    }
}

/// Whether it is safe to patch every workspace to `new_version`.
///
/// Returns false when at least one workspace's current version is newer than
/// the target; Terraform does not support downgrades, so the whole batch is
/// rejected rather than partially applied. Workspaces whose current version
/// cannot be parsed are not treated as newer.
pub fn check_versions(workspaces: &[Workspace], new_version: &TerraformVersion) -> bool {
    for workspace in workspaces {
        match TerraformVersion::parse(&workspace.terraform_version) {
            Some(current) => {
                if current > *new_version {
                    error!(
                        "Workspace '{}' is at version {} which is newer than {}",
                        workspace.name, workspace.terraform_version, new_version
                    );
                    return false;
                }
            }
            None => {
                error!(
                    "Workspace '{}' has an unparseable version '{}'; treating it \
                     as not newer than {}",
                    workspace.name, workspace.terraform_version, new_version
                );
            }
        }
    }
    true
}

/// Patch the Terraform version of every workspace.
///
/// All-or-nothing precondition: if any workspace would be downgraded, zero
/// PATCH calls are issued and the operation aborts with a dedicated
/// diagnostic, distinct from per-item failures.
pub async fn patch_versions(
    client: &TfeClient,
    workspaces: &[Workspace],
    new_version: &TerraformVersion,
) -> Result<BatchResult> {
    if !check_versions(workspaces, new_version) {
        return Err(TfeError::Precondition(format!(
            "at least one workspace is already running a version newer than {} \
             and downgrades are not supported; no workspaces were patched",
            new_version
        )));
    }

    let patch = AttributePatch::new(
        "terraform-version",
        |ws| ws.terraform_version.clone(),
        serde_json::json!(new_version.to_string()),
    );
    batch::patch_workspaces(client, workspaces, &[patch]).await
}

/// Group workspaces by their Terraform version.
pub fn group_by_version(workspaces: &[Workspace]) -> BTreeMap<String, Vec<&Workspace>> {
    let mut groups: BTreeMap<String, Vec<&Workspace>> = BTreeMap::new();
    for workspace in workspaces {
        groups
            .entry(workspace.terraform_version.clone())
            .or_default()
            .push(workspace);
    }
    groups
}
