//! tfmgr - Manage Terraform Cloud/Enterprise workspaces in batch fashion
//!
//! Fetches a filtered set of workspaces from one organization and applies a
//! mutation to each of them, with independent per-workspace outcomes and an
//! aggregated, idempotent report.
//!
//! # Example
//!
//! ```bash
//! # Upgrade every workspace matching a pattern (refuses downgrades)
//! tfmgr --org my-org -w "prod-*" set-version 1.6.0
//!
//! # Lock everything except the sandbox workspaces
//! tfmgr --org my-org -w "sandbox-*" --blacklist lock
//!
//! # Idempotently configure variables from a file
//! tfmgr --org my-org configure-vars variables.json
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod tfe;
pub mod ui;

pub use cli::{Cli, Command};
pub use error::{Result, TfeError};
pub use tfe::{
    BatchResult, ExecutionMode, RowStatus, Terraform, TerraformVersion, TfeClient, TokenResolver,
    Variable, VariableReport, Workspace, WorkspaceFilter,
};
