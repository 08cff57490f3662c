//! tfmgr - Main entry point

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, info};

use tfmgr::output::{render_batch_report, render_variable_report, render_version_summary};
use tfmgr::tfe::variables;
use tfmgr::ui::{create_spinner, finish_spinner};
use tfmgr::{Cli, Command, Terraform, TfeError, TokenResolver};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    info!("Starting tfmgr v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Execute the selected command; returns whether it fully succeeded.
async fn run(cli: &Cli) -> Result<bool, TfeError> {
    // The variables template never touches the network
    if let Command::CreateVarsTemplate = cli.command {
        let path = Path::new("template.json");
        variables::create_variables_template(path)?;
        if !cli.silent {
            println!("Successfully created {}.", path.display());
        }
        return Ok(true);
    }

    let token = TokenResolver::new(&cli.host).resolve(cli.token.as_deref())?;
    let terraform = Terraform::new(
        &cli.host,
        &cli.org,
        token,
        cli.no_tls,
        cli.workspaces.as_deref(),
        cli.blacklist,
    )?;

    let spinner = create_spinner(
        &format!("Fetching workspaces from organization '{}'...", cli.org),
        cli.silent,
    );
    let fetch_result = terraform.workspaces().await.map(|w| w.len());
    finish_spinner(spinner);
    let workspace_count = fetch_result?;

    debug!(
        "Targeting {} workspace(s) in organization '{}'",
        workspace_count, cli.org
    );
    if workspace_count == 0 {
        let detail = match &cli.workspaces {
            Some(patterns) => format!("with these name pattern(s): {}", patterns.join(", ")),
            None => "in your organization".to_string(),
        };
        return Err(TfeError::Precondition(format!(
            "no workspaces could be found {}",
            detail
        )));
    }

    match &cli.command {
        Command::Summary => {
            let groups = terraform.version_groups().await?;
            if !cli.silent {
                render_version_summary(&summary_title(&terraform), &groups);
            }
            Ok(true)
        }
        Command::SetVersion { version } => {
            let result = terraform.set_versions(version).await?;
            if !cli.silent {
                render_batch_report(&report_title(&terraform, "version patch"), &result);
            }
            Ok(result.all_successful)
        }
        Command::Lock => {
            let result = terraform.lock_workspaces(true).await?;
            if !cli.silent {
                render_batch_report(&report_title(&terraform, "lock"), &result);
            }
            Ok(result.all_successful)
        }
        Command::Unlock => {
            let result = terraform.lock_workspaces(false).await?;
            if !cli.silent {
                render_batch_report(&report_title(&terraform, "unlock"), &result);
            }
            Ok(result.all_successful)
        }
        Command::SetWorkingDir { directory } => {
            let result = terraform
                .set_working_directories(directory.as_deref())
                .await?;
            if !cli.silent {
                render_batch_report(
                    &report_title(&terraform, "working directory patch"),
                    &result,
                );
            }
            Ok(result.all_successful)
        }
        Command::SetExecutionMode {
            mode,
            agent_pool_id,
        } => {
            let result = terraform
                .set_execution_modes(mode, agent_pool_id.as_deref())
                .await?;
            if !cli.silent {
                render_batch_report(&report_title(&terraform, "execution mode patch"), &result);
            }
            Ok(result.all_successful)
        }
        Command::SetAutoApply { enabled } => {
            let result = terraform.set_auto_apply(*enabled).await?;
            if !cli.silent {
                render_batch_report(&report_title(&terraform, "auto-apply patch"), &result);
            }
            Ok(result.all_successful)
        }
        Command::SetSpeculative { enabled } => {
            let result = terraform.set_speculative(*enabled).await?;
            if !cli.silent {
                render_batch_report(&report_title(&terraform, "speculative patch"), &result);
            }
            Ok(result.all_successful)
        }
        Command::ConfigureVars { file } => {
            let parsed = variables::parse_variables(file)?;
            let result = terraform.configure_variables(&parsed).await?;
            if !cli.silent {
                render_variable_report(
                    &report_title(&terraform, "variable configuration"),
                    &result,
                );
            }
            Ok(result.all_successful)
        }
        Command::DeleteVars { keys } => {
            let result = terraform.delete_variables(keys).await?;
            if !cli.silent {
                render_variable_report(&report_title(&terraform, "variable deletion"), &result);
            }
            Ok(result.all_successful)
        }
        Command::CreateVarsTemplate => unreachable!("handled before workspace fetch"),
    }
}

fn report_title(terraform: &Terraform, operation: &str) -> String {
    format!(
        "Terraform workspace {} results for organization \"{}\" at \"{}\":",
        operation,
        terraform.organization(),
        terraform.host()
    )
}

fn summary_title(terraform: &Terraform) -> String {
    format!(
        "Terraform version summary for organization \"{}\" at \"{}\":",
        terraform.organization(),
        terraform.host()
    )
}
