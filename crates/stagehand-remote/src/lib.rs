//! Remote collaborators for Stagehand
//!
//! This crate wraps the services the release manager talks to:
//!
//! - **Release hosting**: GitHub Releases over the REST API, plus a dry-run
//!   host that records mutations instead of executing them.
//! - **Mail**: an HTTP mail API used to notify the operator of intake
//!   requests.
//!
//! ## Usage
//!
//! ```ignore
//! use stagehand_remote::{GitHubConfig, GitHubReleases, ReleaseHost, RepoRef};
//!
//! let host = GitHubReleases::new(GitHubConfig::default())?;
//! let releases = host.list_releases(&RepoRef::new("octo", "boochat")).await?;
//! ```

pub mod dry_run;
pub mod error;
pub mod github;
pub mod mail;
pub mod traits;
pub mod types;

pub use dry_run::DryRunHost;
pub use error::{RemoteError, Result};
pub use github::{GitHubConfig, GitHubReleases};
pub use mail::{HttpMailer, MailConfig};
pub use traits::{Mailer, ReleaseHost};
pub use types::*;
