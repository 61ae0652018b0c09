//! Normalize command

use clap::Args;
use tracing::info;

use stagehand_core::catalog::{load_catalog, normalize_catalog, save_catalog};
use stagehand_core::error::{StagehandError, WorkflowError};
use stagehand_core::workflow::{rename_remote_assets, RemoteRenameStatus};

use crate::cli::{output, Cli, Host, OutputFormat};

/// Rewrite catalog asset names and tags to canonical form
#[derive(Debug, Args)]
pub struct NormalizeCommand {
    /// Also rename the assets on the release host
    #[arg(long)]
    pub remote: bool,
}

impl NormalizeCommand {
    /// Execute the normalize command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(remote = self.remote, dry_run = cli.dry_run, "executing normalize command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = cli.tool_config()?;
        let catalog_path = cli.catalog_path(&config)?;
        let mut catalog = load_catalog(&catalog_path)?;

        let report = normalize_catalog(&mut catalog);
        if !report.changed() {
            match cli.format {
                OutputFormat::Json => output::json(&report)?,
                OutputFormat::Text if !cli.quiet => {
                    output::success("Catalog already normalized")
                }
                OutputFormat::Text => {}
            }
            return Ok(());
        }

        if cli.is_text() {
            for rename in &report.renames {
                output::info(&format!(
                    "{} {}: {} -> {}",
                    rename.app_id, rename.tag, rename.from, rename.to
                ));
            }
        }

        let mut remote = Vec::new();
        if self.remote && !report.renames.is_empty() {
            let host = Host::connect(&config, cli.dry_run)?;
            remote = rename_remote_assets(host.as_dyn(), &report.renames).await?;
            if cli.is_text() {
                for result in &remote {
                    let line = format!("{} on {}", result.rename.to, result.rename.tag);
                    match &result.status {
                        RemoteRenameStatus::Renamed => output::success(&format!("Renamed {}", line)),
                        RemoteRenameStatus::AlreadyCanonical => {
                            output::info(&format!("Already named {}", line))
                        }
                        RemoteRenameStatus::Missing | RemoteRenameStatus::ReleaseMissing => {
                            output::warning(&format!("Not found on host: {}", result.rename.from))
                        }
                        RemoteRenameStatus::Failed(e) => {
                            output::error(&format!("{}: {}", result.rename.from, e))
                        }
                    }
                }
                if cli.dry_run {
                    host.report_planned();
                }
            }
        }

        if cli.dry_run {
            if cli.is_text() {
                output::info(&format!("[dry-run] would write {}", catalog_path.display()));
            }
        } else {
            save_catalog(&catalog_path, &catalog)?;
        }

        match cli.format {
            OutputFormat::Json => output::json(&serde_json::json!({
                "catalog": report,
                "remote": remote,
            }))?,
            OutputFormat::Text if !cli.quiet => output::success(&format!(
                "Normalized {} asset names and {} tags",
                report.renames.len(),
                report.retagged
            )),
            OutputFormat::Text => {}
        }

        let failed = remote
            .iter()
            .filter(|r| matches!(r.status, RemoteRenameStatus::Failed(_)))
            .count();
        if failed > 0 {
            return Err(StagehandError::from(WorkflowError::StepFailed {
                step: "normalize".to_string(),
                reason: format!("{} remote renames failed", failed),
            })
            .into());
        }
        Ok(())
    }
}
