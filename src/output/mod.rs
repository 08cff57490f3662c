//! Report rendering
//!
//! Turns batch operation results into tabulated output on stdout.

mod report;

pub use report::{render_batch_report, render_variable_report, render_version_summary};
