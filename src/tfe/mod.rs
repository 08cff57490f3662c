//! Terraform API client module
//!
//! Provides the HTTP client, pagination, throttling, and the workspace batch
//! operations built on top of them.

pub mod batch;
mod client;
mod credentials;
pub mod execution_modes;
pub mod flags;
pub mod locking;
mod session;
mod throttle;
pub mod variables;
pub mod versions;
pub mod working_directories;
pub mod workspaces;

pub use batch::{AttributePatch, BatchResult, ReportRow, RowStatus};
pub use client::{ApiResponse, PagedResult, TfeClient};
pub use credentials::TokenResolver;
pub use execution_modes::ExecutionMode;
pub use session::Terraform;
pub use throttle::RateLimiter;
pub use variables::{Variable, VariableCategory, VariableReport, VariableReportRow};
pub use versions::{TerraformVersion, LATEST_VERSION};
pub use workspaces::{Workspace, WorkspaceFilter};
