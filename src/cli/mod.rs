//! CLI argument parsing

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::defaults;

/// Manage Terraform Cloud/Enterprise workspaces in batch fashion
#[derive(Parser, Debug)]
#[command(name = "tfmgr")]
#[command(version)]
#[command(about = "Manage Terraform Cloud/Enterprise workspaces in batch fashion", long_about = None)]
#[command(subcommand_precedence_over_arg = true)]
pub struct Cli {
    /// The organization to target
    #[arg(short, long)]
    pub org: String,

    /// Terraform host (defaults to Terraform Cloud; set for Enterprise)
    #[arg(short = 'H', long, default_value = defaults::HOST)]
    pub host: String,

    /// Use plain HTTP instead of HTTPS (self-hosted test installations only)
    #[arg(long, default_value_t = false)]
    pub no_tls: bool,

    /// API token (overrides env vars and credentials file)
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// Workspace name pattern(s) to target; shell globs, case-insensitive.
    /// All workspaces are targeted when omitted.
    #[arg(short, long = "workspaces", num_args = 1.., value_name = "PATTERN")]
    pub workspaces: Option<Vec<String>>,

    /// Invert the selection: target every workspace NOT matching the patterns
    #[arg(short, long, default_value_t = false, requires = "workspaces")]
    pub blacklist: bool,

    /// Suppress report output (exit status still reflects the outcome)
    #[arg(long, default_value_t = false)]
    pub silent: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = defaults::LOG_LEVEL)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Batch operations over the selected workspaces
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Tabulate the selected workspaces grouped by Terraform version
    Summary,

    /// Patch the Terraform version (refuses downgrades)
    SetVersion {
        /// Semantic version, or "latest" for auto-updating
        version: String,
    },

    /// Lock the selected workspaces
    Lock,

    /// Unlock the selected workspaces
    Unlock,

    /// Set the working directory; omit the argument to clear it
    SetWorkingDir {
        directory: Option<String>,
    },

    /// Set the execution mode (remote, local, or agent)
    SetExecutionMode {
        mode: String,

        /// Agent pool id; required for (and only valid with) agent mode
        #[arg(long, value_name = "ID")]
        agent_pool_id: Option<String>,
    },

    /// Set the auto-apply flag
    SetAutoApply {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::value_parser!(bool))]
        enabled: bool,
    },

    /// Set the speculative-runs flag
    SetSpeculative {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::value_parser!(bool))]
        enabled: bool,
    },

    /// Create or update variables from a JSON file (idempotent)
    ConfigureVars {
        file: PathBuf,
    },

    /// Delete variables by key (deleting an absent key is a no-op)
    DeleteVars {
        #[arg(required = true, value_name = "KEY")]
        keys: Vec<String>,
    },

    /// Write an exemplary variables file (template.json) to the current directory
    CreateVarsTemplate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["tfmgr", "--org", "my-org", "lock"]);
        assert_eq!(cli.org, "my-org");
        assert_eq!(cli.host, defaults::HOST);
        assert_eq!(cli.log_level, defaults::LOG_LEVEL);
        assert!(!cli.no_tls);
        assert!(!cli.blacklist);
        assert!(!cli.silent);
        assert!(cli.workspaces.is_none());
        assert!(cli.token.is_none());
        assert!(matches!(cli.command, Command::Lock));
    }

    #[test]
    fn test_cli_requires_org() {
        assert!(Cli::try_parse_from(["tfmgr", "lock"]).is_err());
    }

    #[test]
    fn test_cli_workspace_patterns() {
        let cli = Cli::parse_from([
            "tfmgr", "--org", "my-org", "-w", "prod-*", "dev-?", "unlock",
        ]);
        assert_eq!(
            cli.workspaces,
            Some(vec!["prod-*".to_string(), "dev-?".to_string()])
        );
    }

    #[test]
    fn test_cli_blacklist_requires_workspaces() {
        assert!(Cli::try_parse_from(["tfmgr", "--org", "my-org", "--blacklist", "lock"]).is_err());

        let cli = Cli::parse_from([
            "tfmgr", "--org", "my-org", "-w", "prod-*", "--blacklist", "lock",
        ]);
        assert!(cli.blacklist);
    }

    #[test]
    fn test_cli_set_version() {
        let cli = Cli::parse_from(["tfmgr", "--org", "my-org", "set-version", "1.6.0"]);
        match cli.command {
            Command::SetVersion { version } => assert_eq!(version, "1.6.0"),
            _ => panic!("Expected SetVersion"),
        }
    }

    #[test]
    fn test_cli_set_working_dir_optional_argument() {
        let cli = Cli::parse_from(["tfmgr", "--org", "o", "set-working-dir"]);
        match cli.command {
            Command::SetWorkingDir { directory } => assert!(directory.is_none()),
            _ => panic!("Expected SetWorkingDir"),
        }

        let cli = Cli::parse_from(["tfmgr", "--org", "o", "set-working-dir", "envs/prod"]);
        match cli.command {
            Command::SetWorkingDir { directory } => {
                assert_eq!(directory.as_deref(), Some("envs/prod"))
            }
            _ => panic!("Expected SetWorkingDir"),
        }
    }

    #[test]
    fn test_cli_set_execution_mode_with_pool() {
        let cli = Cli::parse_from([
            "tfmgr",
            "--org",
            "o",
            "set-execution-mode",
            "agent",
            "--agent-pool-id",
            "apool-1",
        ]);
        match cli.command {
            Command::SetExecutionMode {
                mode,
                agent_pool_id,
            } => {
                assert_eq!(mode, "agent");
                assert_eq!(agent_pool_id.as_deref(), Some("apool-1"));
            }
            _ => panic!("Expected SetExecutionMode"),
        }
    }

    #[test]
    fn test_cli_set_auto_apply_parses_bool() {
        let cli = Cli::parse_from(["tfmgr", "--org", "o", "set-auto-apply", "true"]);
        match cli.command {
            Command::SetAutoApply { enabled } => assert!(enabled),
            _ => panic!("Expected SetAutoApply"),
        }

        assert!(Cli::try_parse_from(["tfmgr", "--org", "o", "set-auto-apply", "yes"]).is_err());
    }

    #[test]
    fn test_cli_delete_vars_requires_keys() {
        assert!(Cli::try_parse_from(["tfmgr", "--org", "o", "delete-vars"]).is_err());

        let cli = Cli::parse_from(["tfmgr", "--org", "o", "delete-vars", "a", "b"]);
        match cli.command {
            Command::DeleteVars { keys } => assert_eq!(keys, vec!["a", "b"]),
            _ => panic!("Expected DeleteVars"),
        }
    }

    #[test]
    fn test_cli_all_global_options() {
        let cli = Cli::parse_from([
            "tfmgr",
            "--org",
            "my-org",
            "-H",
            "tfe.example.com",
            "--no-tls",
            "-t",
            "tok",
            "-w",
            "prod-*",
            "--silent",
            "-l",
            "debug",
            "summary",
        ]);
        assert_eq!(cli.host, "tfe.example.com");
        assert!(cli.no_tls);
        assert_eq!(cli.token.as_deref(), Some("tok"));
        assert!(cli.silent);
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Command::Summary));
    }
}
