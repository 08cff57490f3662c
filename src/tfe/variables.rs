//! Workspace variable management: idempotent upsert, deletion, file parsing

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{api, report};
use crate::error::{Result, TfeError};
use crate::tfe::batch::{wrap_text, RowStatus};
use crate::tfe::workspaces::Workspace;
use crate::tfe::TfeClient;

/// Variable category: Terraform input variable or environment variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableCategory {
    Terraform,
    Env,
}

impl fmt::Display for VariableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terraform => write!(f, "terraform"),
            Self::Env => write!(f, "env"),
        }
    }
}

/// A workspace variable.
///
/// The server-assigned variable id is deliberately not stored here; upsert
/// identity is the (key, category) pair, which keeps create and update logic
/// uniform. Construction normalizes the fields the same way the API would:
/// an unknown category falls back to `terraform`, and the HCL option is only
/// available for Terraform variables.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct Variable {
    pub key: String,
    pub value: String,
    pub description: String,
    pub category: VariableCategory,
    pub hcl: bool,
    pub sensitive: bool,
}

/// Wire/file shape with optional fields; normalized into [`Variable`]
#[derive(Deserialize)]
struct RawVariable {
    key: String,
    /// Null for sensitive variables fetched from the API
    value: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    hcl: bool,
    #[serde(default)]
    sensitive: bool,
}

impl From<RawVariable> for Variable {
    fn from(raw: RawVariable) -> Self {
        let category = match raw.category.as_deref() {
            Some("env") => VariableCategory::Env,
            _ => VariableCategory::Terraform,
        };
        Self {
            key: raw.key,
            value: raw.value.unwrap_or_default(),
            description: raw.description,
            category,
            hcl: raw.hcl && category == VariableCategory::Terraform,
            sensitive: raw.sensitive,
        }
    }
}

impl Variable {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: String::new(),
            category: VariableCategory::Terraform,
            hcl: false,
            sensitive: false,
        }
    }

    /// Whether the key fits the accepted character set
    pub fn is_valid(&self) -> bool {
        !self.key.is_empty()
            && self
                .key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Parse one variable out of an attributes object; `None` when key or
    /// value is missing. A present-but-null value is accepted as empty (the
    /// API withholds the values of sensitive variables).
    pub fn from_json(json: &Value) -> Option<Self> {
        if json.get("key").is_none() || json.get("value").is_none() {
            return None;
        }
        serde_json::from_value::<RawVariable>(json.clone())
            .ok()
            .map(Variable::from)
    }

    fn to_attributes(&self) -> Value {
        serde_json::json!({
            "key": self.key,
            "value": self.value,
            "description": self.description,
            "category": self.category.to_string(),
            "hcl": self.hcl,
            "sensitive": self.sensitive,
        })
    }

    /// Upsert identity: the same key may exist once per category.
    fn identity(&self) -> (&str, VariableCategory) {
        (&self.key, self.category)
    }
}

/// Sensitive values never appear in logs.
impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("key", &self.key)
            .field(
                "value",
                if self.sensitive { &"<REDACTED>" } else { &self.value },
            )
            .field("description", &self.description)
            .field("category", &self.category)
            .field("hcl", &self.hcl)
            .field("sensitive", &self.sensitive)
            .finish()
    }
}

/// One line of a variable operation report
#[derive(Debug, Clone)]
pub struct VariableReportRow {
    pub workspace: String,
    pub key: String,
    pub operation: &'static str,
    pub status: RowStatus,
    pub message: String,
}

/// Aggregated outcome of a variable operation
#[derive(Debug)]
pub struct VariableReport {
    pub rows: Vec<VariableReportRow>,
    pub all_successful: bool,
}

/// Parse variables out of a JSON file (an array of variable objects).
///
/// Entries that fail to parse are skipped with a warning; read and top-level
/// parse failures are hard errors.
pub fn parse_variables(path: &Path) -> Result<Vec<Variable>> {
    let content = fs::read_to_string(path)
        .map_err(|e| TfeError::Io(format!("unable to read {}: {}", path.display(), e)))?;
    let entries: Vec<Value> = serde_json::from_str(&content).map_err(|e| {
        TfeError::Json(format!("unable to parse {} as JSON: {}", path.display(), e))
    })?;

    let mut variables = Vec::with_capacity(entries.len());
    for entry in &entries {
        match Variable::from_json(entry) {
            Some(variable) => variables.push(variable),
            None => warn!(
                "A variable was not successfully parsed from {}. Its JSON is {}",
                path.display(),
                entry
            ),
        }
    }
    Ok(variables)
}

/// Write an exemplary variables file to the given path.
pub fn create_variables_template(path: &Path) -> Result<()> {
    let example = vec![Variable::new("key1", "value1"), Variable::new("key2", "value2")];
    let content = serde_json::to_string_pretty(&example)?;
    fs::write(path, content)
        .map_err(|e| TfeError::Io(format!("unable to write {}: {}", path.display(), e)))?;
    Ok(())
}

/// Fetch a workspace's existing variables, keyed by server-assigned id.
///
/// Returns `None` when the fetch fails or any entry cannot be parsed; the
/// caller marks the workspace failed and skips it rather than risk creating
/// duplicates against an unknown baseline.
async fn existing_variables(
    client: &TfeClient,
    workspace: &Workspace,
) -> Option<HashMap<String, Variable>> {
    let path = format!("/{}/{}/{}", api::WORKSPACES, workspace.id, api::VARS);
    let response = client.get(&path).await;
    if response.status != 200 {
        error!(
            "Failed to get the existing variables for workspace '{}': {}",
            workspace.name,
            response.error_message()
        );
        return None;
    }

    let mut variables = HashMap::new();
    if let Some(data) = response.body.get("data").and_then(Value::as_array) {
        for entry in data {
            let id = entry.get("id").and_then(Value::as_str);
            let attributes = entry.get("attributes");
            match (id, attributes.and_then(Variable::from_json)) {
                (Some(id), Some(variable)) => {
                    variables.insert(id.to_string(), variable);
                }
                _ => {
                    warn!(
                        "A variable was not successfully parsed from {} for workspace '{}'",
                        entry, workspace.name
                    );
                    return None;
                }
            }
        }
    }
    Some(variables)
}

/// Create or update variables across every workspace (idempotent upsert).
///
/// Per workspace: fetch existing variables, partition the desired set into
/// creations (no existing (key, category) match) and updates (full replace of
/// the matched variable), then apply both phases in full even if individual
/// requests fail.
pub async fn configure_variables(
    client: &TfeClient,
    workspaces: &[Workspace],
    variables: &[Variable],
) -> VariableReport {
    let mut rows = Vec::new();
    let mut all_successful = true;

    for workspace in workspaces {
        let existing = match existing_variables(client, workspace).await {
            Some(existing) => existing,
            None => {
                all_successful = false;
                continue;
            }
        };

        let mut creations: Vec<&Variable> = Vec::new();
        let mut updates: Vec<(&str, &Variable)> = Vec::new();
        for desired in variables {
            match existing
                .iter()
                .find(|(_, old)| old.identity() == desired.identity())
            {
                Some((id, _)) => updates.push((id.as_str(), desired)),
                None => creations.push(desired),
            }
        }

        for variable in creations {
            let path = format!("/{}/{}/{}", api::WORKSPACES, workspace.id, api::VARS);
            let body = serde_json::json!({
                "data": {"type": "vars", "attributes": variable.to_attributes()}
            });
            let response = client.post(&path, &body).await;
            if response.status == 201 {
                rows.push(VariableReportRow {
                    workspace: workspace.name.clone(),
                    key: variable.key.clone(),
                    operation: "create",
                    status: RowStatus::Success,
                    message: String::new(),
                });
            } else {
                all_successful = false;
                rows.push(VariableReportRow {
                    workspace: workspace.name.clone(),
                    key: variable.key.clone(),
                    operation: "create",
                    status: RowStatus::Error,
                    message: wrap_text(&response.error_message(), report::MESSAGE_COLUMN_LIMIT),
                });
            }
        }

        for (variable_id, variable) in updates {
            let path = format!(
                "/{}/{}/{}/{}",
                api::WORKSPACES,
                workspace.id,
                api::VARS,
                variable_id
            );
            let body = serde_json::json!({
                "data": {"type": "vars", "id": variable_id, "attributes": variable.to_attributes()}
            });
            let response = client.patch(&path, &body).await;
            if response.status == 200 {
                rows.push(VariableReportRow {
                    workspace: workspace.name.clone(),
                    key: variable.key.clone(),
                    operation: "update",
                    status: RowStatus::Success,
                    message: String::new(),
                });
            } else {
                all_successful = false;
                rows.push(VariableReportRow {
                    workspace: workspace.name.clone(),
                    key: variable.key.clone(),
                    operation: "update",
                    status: RowStatus::Error,
                    message: wrap_text(&response.error_message(), report::MESSAGE_COLUMN_LIMIT),
                });
            }
        }
    }

    VariableReport {
        rows,
        all_successful,
    }
}

/// Delete variables by key across every workspace.
///
/// Idempotent per workspace: a key with no matching variable simply has
/// nothing to remove and produces no row. Keys present in more than one
/// category are all deleted.
pub async fn delete_variables(
    client: &TfeClient,
    workspaces: &[Workspace],
    keys: &[String],
) -> VariableReport {
    let mut rows = Vec::new();
    let mut all_successful = true;

    for workspace in workspaces {
        let existing = match existing_variables(client, workspace).await {
            Some(existing) => existing,
            None => {
                all_successful = false;
                continue;
            }
        };

        for key in keys {
            let matches: Vec<&String> = existing
                .iter()
                .filter(|(_, variable)| &variable.key == key)
                .map(|(id, _)| id)
                .collect();
            if matches.is_empty() {
                debug!(
                    "Workspace '{}' has no variable with key '{}'; nothing to remove",
                    workspace.name, key
                );
                continue;
            }
            for variable_id in matches {
                let path = format!(
                    "/{}/{}/{}/{}",
                    api::WORKSPACES,
                    workspace.id,
                    api::VARS,
                    variable_id
                );
                let response = client.delete(&path).await;
                if response.is_success() {
                    rows.push(VariableReportRow {
                        workspace: workspace.name.clone(),
                        key: key.clone(),
                        operation: "delete",
                        status: RowStatus::Success,
                        message: String::new(),
                    });
                } else {
                    all_successful = false;
                    rows.push(VariableReportRow {
                        workspace: workspace.name.clone(),
                        key: key.clone(),
                        operation: "delete",
                        status: RowStatus::Error,
                        message: wrap_text(
                            &response.error_message(),
                            report::MESSAGE_COLUMN_LIMIT,
                        ),
                    });
                }
            }
        }
    }

    VariableReport {
        rows,
        all_successful,
    }
}
