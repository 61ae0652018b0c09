//! The app catalog (`apps.json`): types, persistence and reconciliation

pub mod links;
pub mod normalize;
mod layout;
mod reconcile;
mod store;
mod types;

pub use links::{download_links, DownloadLink};
pub use normalize::{normalize_app, normalize_catalog, AssetRename, NormalizeReport};
pub use reconcile::{is_newest_first, recency_key};
pub use store::*;
pub use types::*;
