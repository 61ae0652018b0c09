//! Release host selection for commands

use std::sync::Arc;

use tracing::warn;

use stagehand_core::config::Config;
use stagehand_remote::{DryRunHost, GitHubReleases, PlannedMutation, ReleaseHost};

use super::output;

/// The host a command talks to
pub enum Host {
    Live(GitHubReleases),
    DryRun(DryRunHost),
}

impl Host {
    /// GitHub, wrapped in a recording host for dry runs
    pub fn connect(config: &Config, dry_run: bool) -> anyhow::Result<Self> {
        let github = GitHubReleases::new(config.github.clone());
        if !dry_run {
            return Ok(Self::Live(github?));
        }

        let dry = match github {
            Ok(github) => DryRunHost::new(Arc::new(github)),
            Err(e) => {
                warn!(error = %e, "GitHub unavailable, dry run sees no releases");
                DryRunHost::offline()
            }
        };
        Ok(Self::DryRun(dry))
    }

    /// Borrow as a trait object
    pub fn as_dyn(&self) -> &dyn ReleaseHost {
        match self {
            Self::Live(host) => host,
            Self::DryRun(host) => host,
        }
    }

    /// Mutations recorded by a dry run
    pub fn planned(&self) -> Vec<PlannedMutation> {
        match self {
            Self::Live(_) => Vec::new(),
            Self::DryRun(host) => host.recorded(),
        }
    }

    /// Print the recorded plan of a dry run
    pub fn report_planned(&self) {
        let planned = self.planned();
        if let Self::DryRun(_) = self {
            if planned.is_empty() {
                output::info("[dry-run] no remote changes");
            }
            for mutation in planned {
                output::info(&format!("[dry-run] would {}", mutation));
            }
        }
    }
}
