//! Cleanup command

use clap::Args;
use console::style;
use dialoguer::{Confirm, Input};
use tracing::info;

use stagehand_core::catalog::load_catalog;
use stagehand_core::error::{StagehandError, WorkflowError};
use stagehand_core::workflow::{
    execute_cleanup, fetch_cleanup_plan, CleanupOptions, CleanupPlan, CleanupReport,
};

use super::flag_pair;
use crate::cli::{output, Cli, Host, OutputFormat};

/// Delete releases and assets the catalog no longer references
#[derive(Debug, Args)]
pub struct CleanupCommand {
    /// App id or name; every app in the same repository is taken into account
    #[arg(short, long)]
    pub app: Option<String>,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Delete git tags together with releases
    #[arg(long, overrides_with = "no_cleanup_tag")]
    pub cleanup_tag: bool,

    /// Keep git tags of deleted releases
    #[arg(long)]
    pub no_cleanup_tag: bool,

    /// Delete stray managed assets from releases that stay
    #[arg(long, overrides_with = "no_cleanup_assets")]
    pub cleanup_assets: bool,

    /// Leave assets of surviving releases alone
    #[arg(long)]
    pub no_cleanup_assets: bool,
}

impl CleanupCommand {
    /// Execute the cleanup command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(app = ?self.app, dry_run = cli.dry_run, "executing cleanup command");
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = cli.tool_config()?;
        let catalog = load_catalog(&cli.catalog_path(&config)?)?;

        let app = match &self.app {
            Some(app) => app.clone(),
            None if !self.yes => Input::<String>::new()
                .with_prompt("App (id or name)")
                .interact_text()?,
            None => anyhow::bail!("--app is required"),
        };

        let options = CleanupOptions {
            delete_tags: flag_pair(self.cleanup_tag, self.no_cleanup_tag)
                .unwrap_or(config.publish.cleanup_tag),
            cleanup_assets: flag_pair(self.cleanup_assets, self.no_cleanup_assets)
                .unwrap_or(config.publish.cleanup_assets),
        };

        let host = Host::connect(&config, cli.dry_run)?;
        let plan = fetch_cleanup_plan(host.as_dyn(), &catalog, &app, &options).await?;

        if cli.is_text() {
            print_plan(&plan);
        }

        let report = if !plan.is_empty() && confirm_plan(cli, self.yes)? {
            Some(execute_cleanup(host.as_dyn(), &plan, &options).await)
        } else {
            None
        };

        match cli.format {
            OutputFormat::Json => {
                output::json(&serde_json::json!({
                    "plan": plan,
                    "report": report,
                    "planned": host.planned(),
                }))?;
            }
            OutputFormat::Text => {
                if let Some(report) = &report {
                    if !cli.quiet {
                        print_report(report);
                    }
                }
                if cli.dry_run && !cli.quiet {
                    host.report_planned();
                }
            }
        }

        match report {
            Some(report) if !report.is_success() => Err(StagehandError::from(
                WorkflowError::StepFailed {
                    step: "cleanup".to_string(),
                    reason: format!("{} deletions failed", report.failures.len()),
                },
            )
            .into()),
            _ => Ok(()),
        }
    }
}

/// Print what a cleanup would delete
pub(crate) fn print_plan(plan: &CleanupPlan) {
    if plan.is_empty() {
        output::success(&format!("Nothing to clean up in {}", plan.repo));
        return;
    }

    println!("{}", output::header(&format!("Cleanup plan for {}", plan.repo)));
    for deletion in &plan.releases {
        println!(
            "  {} release {} ({})",
            style("-").red(),
            output::tag_style().apply_to(&deletion.release.tag_name),
            deletion.reason
        );
    }
    for deletion in &plan.assets {
        println!(
            "  {} asset {} on {}",
            style("-").red(),
            deletion.asset.name,
            output::tag_style().apply_to(&deletion.release.tag_name)
        );
    }
    if !plan.ignored.is_empty() {
        println!(
            "{}",
            output::key_value("Ignored (not version tags)", &plan.ignored.join(", "))
        );
    }
}

/// Ask before deleting; dry runs and `--yes` skip the prompt
pub(crate) fn confirm_plan(cli: &Cli, yes: bool) -> anyhow::Result<bool> {
    if yes || cli.dry_run {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt("Proceed with deletion?")
        .default(false)
        .interact()?;
    if !confirmed && !cli.quiet {
        output::warning("Cleanup skipped.");
    }
    Ok(confirmed)
}

/// Print what a cleanup run did
pub(crate) fn print_report(report: &CleanupReport) {
    for tag in &report.deleted_releases {
        output::success(&format!("Deleted release {}", tag));
    }
    for tag in &report.deleted_tags {
        output::success(&format!("Deleted tag {}", tag));
    }
    for asset in &report.deleted_assets {
        output::success(&format!("Deleted asset {}", asset));
    }
    for failure in &report.failures {
        output::error(&format!("{}: {}", failure.target, failure.error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_cleanup_flags() {
        let cli = Cli::try_parse_from([
            "stagehand",
            "cleanup",
            "--app",
            "boochat",
            "-y",
            "--no-cleanup-tag",
        ])
        .unwrap();
        let crate::cli::Commands::Cleanup(cmd) = cli.command else {
            panic!("expected cleanup");
        };
        assert!(cmd.yes);
        assert_eq!(flag_pair(cmd.cleanup_tag, cmd.no_cleanup_tag), Some(false));
        assert_eq!(flag_pair(cmd.cleanup_assets, cmd.no_cleanup_assets), None);
    }

    #[test]
    fn test_confirm_skipped_for_dry_run() {
        let cli = Cli::try_parse_from(["stagehand", "--dry-run", "cleanup"]).unwrap();
        assert!(confirm_plan(&cli, false).unwrap());
    }
}
