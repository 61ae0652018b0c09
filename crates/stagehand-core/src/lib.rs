//! Stagehand Core - release management for mobile app builds
//!
//! This crate holds the domain types, version and tag rules, the `apps.json`
//! catalog, the tool configuration, and the publish and cleanup workflows.
//! Remote services are reached through the traits of `stagehand-remote`.

pub mod asset;
pub mod catalog;
pub mod config;
pub mod error;
pub mod intake;
pub mod tag;
pub mod types;
pub mod version;
pub mod workflow;

pub use asset::{asset_name, asset_name_for, parse_managed_asset, platform_of, ManagedAsset};
pub use catalog::{load_catalog, save_catalog, AppEntry, AppsConfig, VersionRecord};
pub use config::Config;
pub use error::{ConfigError, Result, StagehandError, VersionError, WorkflowError};
pub use intake::{notify_operator, render_notification, NotifyOutcome, TestFlightRequest};
pub use tag::{base_tag, base_tag_of, parse_release_tag, resolve_tag_style, ReleaseTag};
pub use types::{Platform, Stage, StageGroup, TagStyle};
pub use version::{parse_version, ParsedVersion, VersionRequest};
