use crate::error::SourceError;
use crate::source::parse::Parser;
use crate::types::route::{RawRoutePoint, Route};

/// Reads a JSON array of `{latitude, longitude, timestamp}` samples.
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, bytes: &[u8]) -> Result<Route, SourceError> {
        let raw: Vec<RawRoutePoint> =
            serde_json::from_slice(bytes).map_err(|e| SourceError::InvalidJson(e.to_string()))?;

        if raw.is_empty() {
            return Err(SourceError::EmptyFile);
        }

        let points = raw
            .into_iter()
            .enumerate()
            .map(|(index, point)| point.into_point(index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Route::new(points))
    }
}
