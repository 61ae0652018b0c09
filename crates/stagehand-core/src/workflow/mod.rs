//! Release workflows

pub mod cleanup;
pub mod files;
#[cfg(test)]
mod memory;
pub mod normalize;
pub mod publish;

pub use cleanup::{
    execute_cleanup, fetch_cleanup_plan, plan_cleanup, CleanupFailure, CleanupOptions,
    CleanupPlan, CleanupReport, DeleteReason, DesiredState,
};
pub use files::{match_files, plan_renames, LocalArtifact, PlannedArtifact};
pub use normalize::{rename_remote_assets, RemoteRename, RemoteRenameStatus};
pub use publish::{PublishOptions, PublishOutcome, PublishStep, PublishWorkflow};
