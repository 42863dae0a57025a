//! Route sources. Every source resolves to a [`Route`] or a [`SourceError`];
//! the engine never learns where a route came from.

pub mod directions;
pub mod parse;

use std::path::Path;

use crate::error::SourceError;
use crate::types::route::{FileFormat, Route};

pub use directions::{DirectionsClient, Waypoint};

/// Reads a route file from disk. Unknown extensions are read as JSON.
pub async fn load_asset(path: &Path) -> Result<Route, SourceError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| SourceError::Fetch(format!("{}: {}", path.display(), e)))?;

    let format = path
        .to_str()
        .and_then(FileFormat::from_filename)
        .unwrap_or(FileFormat::Json);

    tracing::info!("Loading {} route asset {}", format.as_str(), path.display());
    parse::parse(&bytes, format)
}
