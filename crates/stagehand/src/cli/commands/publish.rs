//! Publish command

use clap::Args;
use console::style;
use dialoguer::{Confirm, Input, Select};
use tracing::info;

use stagehand_core::catalog::{load_catalog, save_catalog, AppsConfig};
use stagehand_core::error::{StagehandError, WorkflowError};
use stagehand_core::types::{Platform, TagStyle};
use stagehand_core::workflow::{
    execute_cleanup, fetch_cleanup_plan, match_files, CleanupOptions, PublishOptions,
    PublishWorkflow,
};

use super::cleanup::{confirm_plan, print_plan, print_report};
use super::flag_pair;
use crate::cli::{output, Cli, Host, OutputFormat};

/// Publish build artifacts to a GitHub release and record them
#[derive(Debug, Args)]
pub struct PublishCommand {
    /// App id or name
    #[arg(short, long)]
    pub app: Option<String>,

    /// Version, e.g. 1.0.0-alpha.2; omit the index to take the next one
    #[arg(long)]
    pub version: Option<String>,

    /// Artifact patterns (`**`, `{a,b}` and `~` supported)
    #[arg(short, long, num_args = 1..)]
    pub files: Vec<String>,

    /// Release notes; `\n` starts a new line
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Publication date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Mark the iOS build as distributed through TestFlight
    #[arg(long, overrides_with = "no_ios_testflight")]
    pub ios_testflight: bool,

    /// Mark the iOS build as not distributed through TestFlight
    #[arg(long)]
    pub no_ios_testflight: bool,

    /// Clean up stale releases afterwards
    #[arg(long, overrides_with = "no_cleanup")]
    pub cleanup: bool,

    /// Skip cleanup
    #[arg(long)]
    pub no_cleanup: bool,

    /// Delete git tags together with releases during cleanup
    #[arg(long, overrides_with = "no_cleanup_tag")]
    pub cleanup_tag: bool,

    /// Keep git tags of deleted releases
    #[arg(long)]
    pub no_cleanup_tag: bool,

    /// Normalize asset names across the whole catalog
    #[arg(long, overrides_with = "no_normalize_assets")]
    pub normalize_assets: bool,

    /// Leave other catalog records as they are
    #[arg(long)]
    pub no_normalize_assets: bool,

    /// Tag style when the repository does not decide it
    #[arg(long)]
    pub tag_style: Option<TagStyle>,

    /// Skip confirmation prompts
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl PublishCommand {
    /// Execute the publish command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            app = ?self.app,
            version = ?self.version,
            files = ?self.files,
            dry_run = cli.dry_run,
            tag_style = ?self.tag_style,
            "executing publish command"
        );
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.execute_async(cli))
    }

    async fn execute_async(&self, cli: &Cli) -> anyhow::Result<()> {
        let config = cli.tool_config()?;
        let catalog_path = cli.catalog_path(&config)?;
        let mut catalog = load_catalog(&catalog_path)?;
        let cwd = std::env::current_dir()?;

        let app = match &self.app {
            Some(app) => app.clone(),
            None => self.prompt_app(cli, &catalog)?,
        };
        let version = match &self.version {
            Some(version) => version.clone(),
            None => self.prompt_text(cli, "Version (e.g. 1.0.0-alpha.2, index optional)")?,
        };
        let files = if self.files.is_empty() {
            vec![self.prompt_text(cli, "Files (glob)")?]
        } else {
            self.files.clone()
        };

        let mut ios_testflight = flag_pair(self.ios_testflight, self.no_ios_testflight);
        if ios_testflight.is_none() && self.can_prompt(cli) {
            let has_ipa = match_files(&files, &cwd)
                .map(|found| found.iter().any(|a| a.platform == Platform::Ios))
                .unwrap_or(false);
            if has_ipa {
                ios_testflight = Some(
                    Confirm::new()
                        .with_prompt("Is the iOS build distributed through TestFlight?")
                        .default(false)
                        .interact()?,
                );
            }
        }

        let publish = &config.publish;
        let options = PublishOptions {
            app: app.clone(),
            version,
            files,
            notes: self.notes.clone().unwrap_or_default(),
            date: self.date.clone(),
            ios_testflight,
            tag_style: self.tag_style,
            default_tag_style: publish.tag_style,
            normalize_assets: flag_pair(self.normalize_assets, self.no_normalize_assets)
                .unwrap_or(publish.normalize_assets),
            base_dir: cwd,
            dry_run: cli.dry_run,
        };

        let host = Host::connect(&config, cli.dry_run)?;
        let outcome = PublishWorkflow::new(host.as_dyn(), options)
            .execute(&mut catalog)
            .await?;

        if cli.dry_run {
            if cli.is_text() {
                output::info(&format!(
                    "[dry-run] would write {}",
                    style(catalog_path.display()).cyan()
                ));
            }
        } else {
            save_catalog(&catalog_path, &catalog)?;
        }

        if cli.is_text() {
            println!("{}", output::header("Published"));
            println!(
                "{}",
                output::key_value("Version", &output::version_style().apply_to(&outcome.version).to_string())
            );
            println!(
                "{}",
                output::key_value("Release", &output::tag_style().apply_to(&outcome.tag).to_string())
            );
            for artifact in &outcome.artifacts {
                println!("{}", output::key_value(artifact.platform.as_str(), &artifact.asset_name));
            }
            if let Some(report) = outcome.normalized.as_ref().filter(|r| r.changed()) {
                output::info(&format!(
                    "Normalized catalog: {} asset names, {} tags",
                    report.renames.len(),
                    report.retagged
                ));
            }
        }

        let mut cleanup_report = None;
        if flag_pair(self.cleanup, self.no_cleanup).unwrap_or(publish.cleanup) {
            let options = CleanupOptions {
                delete_tags: flag_pair(self.cleanup_tag, self.no_cleanup_tag)
                    .unwrap_or(publish.cleanup_tag),
                cleanup_assets: publish.cleanup_assets,
            };
            let plan = fetch_cleanup_plan(host.as_dyn(), &catalog, &app, &options).await?;
            if cli.is_text() {
                print_plan(&plan);
            }
            if !plan.is_empty() && confirm_plan(cli, self.yes)? {
                let report = execute_cleanup(host.as_dyn(), &plan, &options).await;
                if cli.is_text() {
                    print_report(&report);
                }
                cleanup_report = Some(report);
            }
        }

        if cli.dry_run && cli.is_text() {
            host.report_planned();
        }

        if cli.format == OutputFormat::Json {
            output::json(&serde_json::json!({
                "publish": outcome,
                "cleanup": cleanup_report,
                "planned": host.planned(),
            }))?;
        } else if !cli.quiet {
            let done = if cli.dry_run {
                format!("Dry run complete for {} {}", outcome.app_id, outcome.version)
            } else {
                format!("Published {} {}", outcome.app_id, outcome.version)
            };
            output::success(&done);
        }

        match cleanup_report {
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

    /// Interactive prompts are off under `--yes` and `--dry-run`
    fn can_prompt(&self, cli: &Cli) -> bool {
        !self.yes && !cli.dry_run
    }

    fn prompt_app(&self, cli: &Cli, catalog: &AppsConfig) -> anyhow::Result<String> {
        if !self.can_prompt(cli) || catalog.apps.is_empty() {
            anyhow::bail!("--app is required");
        }
        let labels: Vec<String> = catalog
            .apps
            .iter()
            .map(|a| format!("{} ({})", a.name, a.id))
            .collect();
        let choice = Select::new()
            .with_prompt("App")
            .items(&labels)
            .default(0)
            .interact()?;
        Ok(catalog.apps[choice].id.clone())
    }

    fn prompt_text(&self, cli: &Cli, prompt: &str) -> anyhow::Result<String> {
        if !self.can_prompt(cli) {
            anyhow::bail!("{} is required", prompt);
        }
        Ok(Input::<String>::new().with_prompt(prompt).interact_text()?)
    }
}
