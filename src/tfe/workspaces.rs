//! Workspace snapshots, name filtering, and the organization-wide fetch

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::config::api;
use crate::error::{Result, TfeError};
use crate::tfe::TfeClient;

/// Immutable snapshot of a workspace, built from API response JSON.
///
/// Mutations happen server-side and are only reflected by re-fetching; there
/// are deliberately no setters here.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub terraform_version: String,
    pub auto_apply: bool,
    pub is_locked: bool,
    /// Empty string means unset
    pub working_directory: String,
    pub execution_mode: String,
    pub agent_pool_id: Option<String>,
    pub speculative: bool,
}

/// Equality is by server-assigned id alone; two snapshots of the same
/// workspace taken before and after a mutation compare equal.
impl PartialEq for Workspace {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Workspace {}

/// Raw list item as the API returns it
#[derive(Deserialize, Debug)]
struct WorkspaceItem {
    id: String,
    attributes: WorkspaceAttributes,
}

#[derive(Deserialize, Debug)]
struct WorkspaceAttributes {
    name: String,

    #[serde(rename = "terraform-version")]
    terraform_version: String,

    #[serde(rename = "auto-apply")]
    auto_apply: bool,

    locked: bool,

    #[serde(rename = "working-directory", default)]
    working_directory: Option<String>,

    #[serde(rename = "execution-mode", default)]
    execution_mode: Option<String>,

    #[serde(rename = "agent-pool-id", default)]
    agent_pool_id: Option<String>,

    #[serde(rename = "speculative-enabled", default = "default_speculative")]
    speculative: bool,
}

fn default_speculative() -> bool {
    true
}

impl From<WorkspaceItem> for Workspace {
    fn from(item: WorkspaceItem) -> Self {
        Self {
            id: item.id,
            name: item.attributes.name,
            terraform_version: item.attributes.terraform_version,
            auto_apply: item.attributes.auto_apply,
            is_locked: item.attributes.locked,
            working_directory: item.attributes.working_directory.unwrap_or_default(),
            execution_mode: item
                .attributes
                .execution_mode
                .unwrap_or_else(|| "remote".to_string()),
            agent_pool_id: item.attributes.agent_pool_id,
            speculative: item.attributes.speculative,
        }
    }
}

/// Map a page's `data` array into workspace snapshots.
///
/// Items missing required attributes are skipped, not errors; the API is the
/// only producer of this JSON and partial items indicate a version mismatch
/// rather than corrupt data.
pub fn map_workspaces(data: &Value) -> Vec<Workspace> {
    let items = match data.as_array() {
        Some(items) => items,
        None => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| {
            match serde_json::from_value::<WorkspaceItem>(item.clone()) {
                Ok(parsed) => Some(Workspace::from(parsed)),
                Err(e) => {
                    warn!("Skipping workspace item that failed to parse: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Name-pattern selection over a fetched workspace collection.
///
/// Patterns use shell-glob semantics (`*`, `?`, character classes) and match
/// case-insensitively. A workspace matches the set if any pattern matches.
#[derive(Debug)]
pub struct WorkspaceFilter {
    matcher: Option<GlobSet>,
    blacklist: bool,
}

impl WorkspaceFilter {
    /// Build a filter from optional patterns and the blacklist flag.
    ///
    /// A blacklist with no patterns would silently select everything, which is
    /// never the intent, so it is rejected here as a configuration error.
    pub fn new(patterns: Option<&[String]>, blacklist: bool) -> Result<Self> {
        let patterns = patterns.filter(|p| !p.is_empty());
        if blacklist && patterns.is_none() {
            return Err(TfeError::Config(
                "--blacklist requires at least one workspace name pattern".to_string(),
            ));
        }
        let matcher = match patterns {
            None => None,
            Some(patterns) => {
                let mut builder = GlobSetBuilder::new();
                for pattern in patterns {
                    let glob = GlobBuilder::new(pattern)
                        .case_insensitive(true)
                        .build()
                        .map_err(|e| {
                            TfeError::Config(format!("invalid workspace pattern '{}': {}", pattern, e))
                        })?;
                    builder.add(glob);
                }
                Some(builder.build().map_err(|e| {
                    TfeError::Config(format!("invalid workspace patterns: {}", e))
                })?)
            }
        };
        Ok(Self { matcher, blacklist })
    }

    /// Filter with no patterns: everything passes.
    pub fn all() -> Self {
        Self {
            matcher: None,
            blacklist: false,
        }
    }

    /// Whether the given workspace survives the filter
    pub fn retains(&self, workspace: &Workspace) -> bool {
        match &self.matcher {
            None => true,
            Some(set) => {
                let matched = set.is_match(&workspace.name);
                if self.blacklist {
                    !matched
                } else {
                    matched
                }
            }
        }
    }
}

/// Fetch all workspaces of an organization, then apply the filter.
///
/// If pagination was cut short by an API error, the partial set is still used
/// but the truncation is logged so the operator knows the selection may be
/// incomplete.
pub async fn fetch_all(
    client: &TfeClient,
    organization: &str,
    filter: &WorkspaceFilter,
) -> Result<Vec<Workspace>> {
    let path = format!(
        "/{}/{}/{}",
        api::ORGANIZATIONS,
        urlencoding::encode(organization),
        api::WORKSPACES
    );

    let result = client.exhaust_pages(&path, map_workspaces).await;
    if result.truncated {
        warn!(
            "Workspace listing for organization '{}' is incomplete: the API \
             returned an error before the last page was fetched",
            organization
        );
    }

    let workspaces: Vec<Workspace> = result
        .flatten()
        .into_iter()
        .filter(|ws| filter.retains(ws))
        .collect();

    debug!(
        "Fetched {} workspace(s) for organization '{}' after filtering",
        workspaces.len(),
        organization
    );
    Ok(workspaces)
}

/// Test fixture shared by unit tests across the crate
#[cfg(test)]
pub(crate) fn test_workspace(id: &str, name: &str) -> Workspace {
    Workspace {
        id: id.to_string(),
        name: name.to_string(),
        terraform_version: "1.5.0".to_string(),
        auto_apply: false,
        is_locked: false,
        working_directory: String::new(),
        execution_mode: "remote".to_string(),
        agent_pool_id: None,
        speculative: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn workspace_json(id: &str, name: &str) -> Value {
        serde_json::json!({
            "id": id,
            "attributes": {
                "name": name,
                "terraform-version": "1.5.0",
                "auto-apply": false,
                "locked": false,
                "working-directory": null,
                "execution-mode": "remote",
                "speculative-enabled": true
            }
        })
    }

    #[test]
    fn test_equality_is_by_id_alone() {
        let a = test_workspace("ws-1", "before");
        let mut b = test_workspace("ws-1", "after");
        b.terraform_version = "1.6.0".to_string();
        b.is_locked = true;
        assert_eq!(a, b);

        let c = test_workspace("ws-2", "before");
        assert_ne!(a, c);
    }

    #[test]
    fn test_map_workspaces_full_attributes() {
        let data = serde_json::json!([{
            "id": "ws-abc",
            "attributes": {
                "name": "net-prod",
                "terraform-version": "1.6.2",
                "auto-apply": true,
                "locked": true,
                "working-directory": "stacks/net",
                "execution-mode": "agent",
                "agent-pool-id": "apool-1",
                "speculative-enabled": false
            }
        }]);
        let mapped = map_workspaces(&data);
        assert_eq!(mapped.len(), 1);
        let ws = &mapped[0];
        assert_eq!(ws.id, "ws-abc");
        assert_eq!(ws.name, "net-prod");
        assert_eq!(ws.terraform_version, "1.6.2");
        assert!(ws.auto_apply);
        assert!(ws.is_locked);
        assert_eq!(ws.working_directory, "stacks/net");
        assert_eq!(ws.execution_mode, "agent");
        assert_eq!(ws.agent_pool_id.as_deref(), Some("apool-1"));
        assert!(!ws.speculative);
    }

    #[test]
    fn test_map_workspaces_defaults_for_optional_attributes() {
        let data = serde_json::json!([{
            "id": "ws-min",
            "attributes": {
                "name": "minimal",
                "terraform-version": "latest",
                "auto-apply": false,
                "locked": false
            }
        }]);
        let mapped = map_workspaces(&data);
        assert_eq!(mapped.len(), 1);
        let ws = &mapped[0];
        assert_eq!(ws.working_directory, "");
        assert_eq!(ws.execution_mode, "remote");
        assert!(ws.agent_pool_id.is_none());
        assert!(ws.speculative);
    }

    #[test]
    fn test_map_workspaces_skips_invalid_items() {
        let data = serde_json::json!([
            {"id": "ws-good", "attributes": {
                "name": "good", "terraform-version": "1.5.0",
                "auto-apply": false, "locked": false
            }},
            {"id": "ws-bad"},
            {"attributes": {"name": "no-id"}}
        ]);
        let mapped = map_workspaces(&data);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].name, "good");
    }

    #[test]
    fn test_map_workspaces_non_array() {
        assert!(map_workspaces(&serde_json::json!({"not": "an array"})).is_empty());
    }

    #[test]
    fn test_filter_no_patterns_returns_all() {
        let filter = WorkspaceFilter::new(None, false).unwrap();
        assert!(filter.retains(&test_workspace("ws-1", "anything")));
    }

    #[test]
    fn test_filter_allow_list() {
        let patterns = vec!["prod-*".to_string()];
        let filter = WorkspaceFilter::new(Some(&patterns), false).unwrap();
        assert!(filter.retains(&test_workspace("ws-1", "prod-network")));
        assert!(!filter.retains(&test_workspace("ws-2", "dev-network")));
    }

    #[test]
    fn test_filter_deny_list() {
        let patterns = vec!["prod-*".to_string()];
        let filter = WorkspaceFilter::new(Some(&patterns), true).unwrap();
        assert!(!filter.retains(&test_workspace("ws-1", "prod-network")));
        assert!(filter.retains(&test_workspace("ws-2", "dev-network")));
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let patterns = vec!["PROD-*".to_string()];
        let filter = WorkspaceFilter::new(Some(&patterns), false).unwrap();
        assert!(filter.retains(&test_workspace("ws-1", "prod-network")));
        assert!(filter.retains(&test_workspace("ws-2", "Prod-Network")));
    }

    #[test]
    fn test_filter_any_pattern_matches() {
        let patterns = vec!["alpha".to_string(), "beta-?".to_string()];
        let filter = WorkspaceFilter::new(Some(&patterns), false).unwrap();
        assert!(filter.retains(&test_workspace("ws-1", "alpha")));
        assert!(filter.retains(&test_workspace("ws-2", "beta-1")));
        assert!(!filter.retains(&test_workspace("ws-3", "beta-12")));
        assert!(!filter.retains(&test_workspace("ws-4", "gamma")));
    }

    #[test]
    fn test_filter_character_classes() {
        let patterns = vec!["env-[0-9]".to_string()];
        let filter = WorkspaceFilter::new(Some(&patterns), false).unwrap();
        assert!(filter.retains(&test_workspace("ws-1", "env-3")));
        assert!(!filter.retains(&test_workspace("ws-2", "env-x")));
    }

    #[test]
    fn test_filter_blacklist_without_patterns_rejected() {
        let err = WorkspaceFilter::new(None, true).unwrap_err();
        match err {
            TfeError::Config(msg) => assert!(msg.contains("--blacklist")),
            _ => panic!("Expected TfeError::Config"),
        }

        let empty: Vec<String> = Vec::new();
        assert!(WorkspaceFilter::new(Some(&empty), true).is_err());
    }

    #[test]
    fn test_filter_invalid_pattern_rejected() {
        let patterns = vec!["prod-[".to_string()];
        assert!(WorkspaceFilter::new(Some(&patterns), false).is_err());
    }

    #[test]
    fn test_filter_partition_property() {
        // Allow-list and deny-list results partition the input set
        let names = ["prod-a", "prod-b", "dev-a", "dev-b", "stage"];
        let workspaces: Vec<Workspace> = names
            .iter()
            .enumerate()
            .map(|(i, n)| test_workspace(&format!("ws-{}", i), n))
            .collect();

        let patterns = vec!["prod-*".to_string(), "stage".to_string()];
        let allow = WorkspaceFilter::new(Some(&patterns), false).unwrap();
        let deny = WorkspaceFilter::new(Some(&patterns), true).unwrap();

        let kept: Vec<&Workspace> = workspaces.iter().filter(|w| allow.retains(w)).collect();
        let dropped: Vec<&Workspace> = workspaces.iter().filter(|w| deny.retains(w)).collect();

        assert_eq!(kept.len() + dropped.len(), workspaces.len());
        for ws in &workspaces {
            let in_kept = kept.iter().any(|w| w.id == ws.id);
            let in_dropped = dropped.iter().any(|w| w.id == ws.id);
            assert!(in_kept != in_dropped, "workspace {} in exactly one side", ws.name);
        }
    }

    #[tokio::test]
    async fn test_fetch_all_paginates_and_filters() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/my-org/workspaces"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [workspace_json("ws-1", "prod-api"), workspace_json("ws-2", "dev-api")],
                "meta": {"pagination": {"next-page": 2}}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/organizations/my-org/workspaces"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [workspace_json("ws-3", "prod-db")],
                "meta": {"pagination": {"next-page": null}}
            })))
            .mount(&mock_server)
            .await;

        let patterns = vec!["prod-*".to_string()];
        let filter = WorkspaceFilter::new(Some(&patterns), false).unwrap();
        let workspaces = fetch_all(&client, "my-org", &filter).await.unwrap();

        let names: Vec<&str> = workspaces.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["prod-api", "prod-db"]);
    }

    #[tokio::test]
    async fn test_fetch_all_partial_on_mid_walk_error() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/my-org/workspaces"))
            .and(query_param("page[number]", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [workspace_json("ws-1", "alpha")],
                "meta": {"pagination": {"next-page": 2}}
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/organizations/my-org/workspaces"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let workspaces = fetch_all(&client, "my-org", &WorkspaceFilter::all())
            .await
            .unwrap();

        assert_eq!(workspaces.len(), 1);
        assert_eq!(workspaces[0].name, "alpha");
    }

    #[tokio::test]
    async fn test_fetch_all_empty_organization() {
        let mock_server = MockServer::start().await;
        let client = TfeClient::test_client(&mock_server.uri());

        Mock::given(method("GET"))
            .and(path("/organizations/empty-org/workspaces"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [],
                "meta": {"pagination": {"next-page": null}}
            })))
            .mount(&mock_server)
            .await;

        let workspaces = fetch_all(&client, "empty-org", &WorkspaceFilter::all())
            .await
            .unwrap();
        assert!(workspaces.is_empty());
    }
}
