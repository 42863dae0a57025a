use chrono::{DateTime, Utc};
use fitparser::profile::MesgNum;

use crate::error::SourceError;
use crate::source::parse::Parser;
use crate::types::route::{Route, RoutePoint};

pub struct FitParser;

impl Parser for FitParser {
    fn parse(&self, bytes: &[u8]) -> Result<Route, SourceError> {
        let data = fitparser::from_bytes(bytes)
            .map_err(|e| SourceError::InvalidFit(format!("Failed to parse FIT file: {}", e)))?;

        let mut points = Vec::new();

        for record in data {
            if record.kind() != MesgNum::Record {
                continue;
            }

            let mut lat = None;
            let mut lon = None;
            let mut time: Option<DateTime<Utc>> = None;

            for field in record.fields() {
                match (field.name(), field.value()) {
                    ("position_lat", fitparser::Value::SInt32(val)) => {
                        lat = Some(semicircles_to_degrees(*val))
                    }
                    ("position_long", fitparser::Value::SInt32(val)) => {
                        lon = Some(semicircles_to_degrees(*val))
                    }
                    ("timestamp", fitparser::Value::Timestamp(val)) => {
                        time = DateTime::from_timestamp(val.timestamp(), 0)
                    }
                    _ => {}
                }
            }

            // Records without a fix (indoor, GPS warm-up) are skipped.
            let (Some(latitude), Some(longitude)) = (lat, lon) else {
                continue;
            };
            let timestamp = time.ok_or(SourceError::MissingTimestamp(points.len()))?;
            points.push(RoutePoint {
                latitude,
                longitude,
                timestamp,
            });
        }

        if points.is_empty() {
            return Err(SourceError::EmptyFile);
        }

        Ok(Route::new(points))
    }
}

fn semicircles_to_degrees(semicircles: i32) -> f64 {
    (semicircles as f64) * (180.0 / 2_147_483_648.0)
}
