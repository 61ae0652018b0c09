//! List command

use clap::Args;
use serde::Serialize;
use tracing::info;

use stagehand_core::catalog::{download_links, load_catalog, AppEntry, AppsConfig, DownloadLink};
use stagehand_core::types::{Stage, StageGroup};

use crate::cli::{output, Cli, OutputFormat};

/// Show the latest build per stage and its download links
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only this app (id or name)
    #[arg(short, long)]
    pub app: Option<String>,
}

#[derive(Debug, Serialize)]
struct AppListing {
    id: String,
    name: String,
    repo: String,
    stages: Vec<StageListing>,
}

#[derive(Debug, Serialize)]
struct StageListing {
    stage: Stage,
    group: StageGroup,
    version: String,
    date: String,
    changelog: String,
    links: Vec<DownloadLink>,
}

fn listing(app: &AppEntry) -> AppListing {
    AppListing {
        id: app.id.clone(),
        name: app.name.clone(),
        repo: app.github.full_name(),
        stages: app
            .latest_per_stage()
            .into_iter()
            .map(|(stage, record)| StageListing {
                stage,
                group: stage.group(),
                version: record.version.clone(),
                date: record.date.clone(),
                changelog: record.changelog.clone(),
                links: download_links(app, record),
            })
            .collect(),
    }
}

fn select<'a>(catalog: &'a AppsConfig, app: Option<&str>) -> anyhow::Result<Vec<&'a AppEntry>> {
    Ok(match app {
        Some(key) => vec![catalog.app(key)?],
        None => catalog.apps.iter().collect(),
    })
}

impl ListCommand {
    /// Execute the list command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(app = ?self.app, "executing list command");
        let config = cli.tool_config()?;
        let catalog = load_catalog(&cli.catalog_path(&config)?)?;
        let listings: Vec<AppListing> = select(&catalog, self.app.as_deref())?
            .into_iter()
            .map(listing)
            .collect();

        if cli.format == OutputFormat::Json {
            return output::json(&listings);
        }
        if cli.quiet {
            return Ok(());
        }

        for app in &listings {
            println!(
                "{} {}",
                output::header(&app.name),
                output::path_style().apply_to(format!("({}, {})", app.id, app.repo))
            );
            if app.stages.is_empty() {
                println!("  no published builds");
            }

            let mut current_group = None;
            for stage in &app.stages {
                if current_group != Some(stage.group) {
                    println!("  {}", output::header(stage.group.as_str()));
                    current_group = Some(stage.group);
                }
                println!(
                    "    {:<8} {} {}",
                    stage.stage.as_str(),
                    output::version_style().apply_to(&stage.version),
                    stage.date
                );
                for link in &stage.links {
                    let mut line = format!("      {}: {}", link.platform, link.url);
                    if link.testflight {
                        line.push_str(" [TestFlight]");
                    }
                    println!("{}", line);
                    if let Some(mirror) = &link.mirror {
                        println!("      {} mirror: {}", link.platform, mirror);
                    }
                }
            }
            println!();
        }
        Ok(())
    }
}
