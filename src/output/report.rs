//! Tabulated report output for batch operations

use comfy_table::{presets::NOTHING, Table};

use crate::tfe::batch::{BatchResult, ReportRow};
use crate::tfe::variables::{VariableReport, VariableReportRow};
use crate::tfe::workspaces::Workspace;

/// Render a batch report: title line, then rows sorted with errors grouped
/// first and workspaces alphabetical within each group.
pub fn render_batch_report(title: &str, result: &BatchResult) {
    let mut rows: Vec<&ReportRow> = result.rows.iter().collect();
    rows.sort_by(|a, b| {
        (a.status, &a.workspace, &a.field).cmp(&(b.status, &b.workspace, &b.field))
    });

    let mut table = Table::new();
    table.load_preset(NOTHING).set_header(vec![
        "Workspace",
        "Field",
        "Before",
        "After",
        "Status",
        "Message",
    ]);
    for row in rows {
        table.add_row(vec![
            row.workspace.clone(),
            row.field.clone(),
            row.before.clone(),
            row.after.clone(),
            row.status.to_string(),
            row.message.clone(),
        ]);
    }

    println!("{}", title);
    println!();
    println!("{}", table);
    println!();
}

/// Render a variable operation report, sorted by status, then operation,
/// workspace, and key.
pub fn render_variable_report(title: &str, result: &VariableReport) {
    let mut rows: Vec<&VariableReportRow> = result.rows.iter().collect();
    rows.sort_by(|a, b| {
        (a.status, a.operation, &a.workspace, &a.key)
            .cmp(&(b.status, b.operation, &b.workspace, &b.key))
    });

    let mut table = Table::new();
    table.load_preset(NOTHING).set_header(vec![
        "Workspace",
        "Variable",
        "Operation",
        "Status",
        "Message",
    ]);
    for row in rows {
        table.add_row(vec![
            row.workspace.clone(),
            row.key.clone(),
            row.operation.to_string(),
            row.status.to_string(),
            row.message.clone(),
        ]);
    }

    println!("{}", title);
    println!();
    println!("{}", table);
    println!();
}

/// Render the version summary: one row per workspace, grouped by version.
pub fn render_version_summary(
    title: &str,
    groups: &std::collections::BTreeMap<String, Vec<&Workspace>>,
) {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_header(vec!["Version", "Workspace"]);
    for (version, workspaces) in groups {
        let mut names: Vec<&str> = workspaces.iter().map(|w| w.name.as_str()).collect();
        names.sort_unstable();
        for name in names {
            table.add_row(vec![version.clone(), name.to_string()]);
        }
    }

    println!("{}", title);
    println!();
    println!("{}", table);
    println!();
}
