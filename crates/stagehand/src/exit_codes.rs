//! Exit codes for the CLI

use stagehand_core::error::{StagehandError, WorkflowError};
use stagehand_remote::RemoteError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Version error
pub const VERSION_ERROR: i32 = 4;

/// Validation error
pub const VALIDATION_ERROR: i32 = 5;

/// Release host or mail API error
pub const REMOTE_ERROR: i32 = 6;

/// User cancelled
pub const CANCELLED: i32 = 130;

/// Exit code for an error reaching `main`
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<StagehandError>() {
        return match err {
            StagehandError::Config(_) => CONFIG_ERROR,
            StagehandError::Version(_) => VERSION_ERROR,
            StagehandError::Workflow(workflow) => workflow_code(workflow),
            StagehandError::Remote(_) => REMOTE_ERROR,
            StagehandError::Io(_) | StagehandError::Other(_) => ERROR,
        };
    }
    if let Some(workflow) = err.downcast_ref::<WorkflowError>() {
        return workflow_code(workflow);
    }
    if err.downcast_ref::<RemoteError>().is_some() {
        return REMOTE_ERROR;
    }
    ERROR
}

fn workflow_code(err: &WorkflowError) -> i32 {
    match err {
        WorkflowError::AppNotFound(_) => CONFIG_ERROR,
        WorkflowError::NoFilesMatched(_)
        | WorkflowError::InvalidPattern { .. }
        | WorkflowError::AssetNameCollision { .. }
        | WorkflowError::TagStyleAmbiguous { .. }
        | WorkflowError::ValidationFailed(_) => VALIDATION_ERROR,
        WorkflowError::Cancelled => CANCELLED,
        WorkflowError::StepFailed { .. } => ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::error::{ConfigError, VersionError};

    #[test]
    fn test_error_categories() {
        let config: anyhow::Error =
            StagehandError::from(ConfigError::MissingField("apps".to_string())).into();
        assert_eq!(for_error(&config), CONFIG_ERROR);

        let version: anyhow::Error =
            StagehandError::from(VersionError::InvalidFormat("1.0".to_string())).into();
        assert_eq!(for_error(&version), VERSION_ERROR);

        let ambiguous: anyhow::Error = StagehandError::from(WorkflowError::TagStyleAmbiguous {
            repo: "octo/boochat".to_string(),
            message: "both".to_string(),
        })
        .into();
        assert_eq!(for_error(&ambiguous), VALIDATION_ERROR);

        let cancelled: anyhow::Error = WorkflowError::Cancelled.into();
        assert_eq!(for_error(&cancelled), CANCELLED);

        let remote: anyhow::Error = StagehandError::from(RemoteError::ApiError {
            status: 502,
            message: "bad gateway".to_string(),
        })
        .into();
        assert_eq!(for_error(&remote), REMOTE_ERROR);

        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
    }

    #[test]
    fn test_context_keeps_category() {
        let err = anyhow::Error::from(StagehandError::from(WorkflowError::NoFilesMatched(
            "*.apk".to_string(),
        )))
        .context("publishing boochat");
        assert_eq!(for_error(&err), VALIDATION_ERROR);
    }
}
