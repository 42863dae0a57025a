use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::geo::haversine_distance;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// A route point as supplied by a source, before its timestamp is normalized.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRoutePoint {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
    pub timestamp: RawTimestamp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    EpochMillis(i64),
    FractionalMillis(f64),
    Iso(String),
}

impl RawTimestamp {
    pub fn normalize(&self) -> Option<DateTime<Utc>> {
        match self {
            RawTimestamp::EpochMillis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            RawTimestamp::FractionalMillis(ms) if ms.is_finite() => {
                Utc.timestamp_millis_opt(ms.floor() as i64).single()
            }
            RawTimestamp::FractionalMillis(_) => None,
            RawTimestamp::Iso(text) => parse_iso(text),
        }
    }

    fn describe(&self) -> String {
        match self {
            RawTimestamp::EpochMillis(ms) => ms.to_string(),
            RawTimestamp::FractionalMillis(ms) => ms.to_string(),
            RawTimestamp::Iso(text) => text.clone(),
        }
    }
}

fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Offset-less timestamps are read as UTC.
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl RawRoutePoint {
    pub fn into_point(self, index: usize) -> Result<RoutePoint, SourceError> {
        let timestamp = self
            .timestamp
            .normalize()
            .ok_or_else(|| SourceError::InvalidTimestamp {
                index,
                value: self.timestamp.describe(),
            })?;
        Ok(RoutePoint {
            latitude: self.latitude,
            longitude: self.longitude,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl Bounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a RoutePoint>) -> Option<Self> {
        points.into_iter().fold(None, |bounds, p| {
            Some(match bounds {
                None => Bounds {
                    min_lat: p.latitude,
                    min_lon: p.longitude,
                    max_lat: p.latitude,
                    max_lon: p.longitude,
                },
                Some(b) => Bounds {
                    min_lat: b.min_lat.min(p.latitude),
                    min_lon: b.min_lon.min(p.longitude),
                    max_lat: b.max_lat.max(p.latitude),
                    max_lon: b.max_lon.max(p.longitude),
                },
            })
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_seconds: u64,
    pub avg_speed_kmh: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum FileFormat {
    Json,
    Gpx,
    Fit,
}

impl FileFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "json" | "geojson" => Some(FileFormat::Json),
            "gpx" => Some(FileFormat::Gpx),
            "fit" => Some(FileFormat::Fit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Json => "json",
            FileFormat::Gpx => "gpx",
            FileFormat::Fit => "fit",
        }
    }
}

/// Ordered sequence of route points. Index order is playback order.
#[derive(Debug, Clone, Default)]
pub struct Route {
    points: Vec<RoutePoint>,
}

impl Route {
    pub fn new(points: Vec<RoutePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    pub fn summary(&self) -> RouteSummary {
        let distance_km = self
            .points
            .windows(2)
            .map(|pair| {
                haversine_distance(
                    pair[0].latitude,
                    pair[0].longitude,
                    pair[1].latitude,
                    pair[1].longitude,
                )
            })
            .sum::<f64>();

        let duration_seconds = match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_seconds().max(0) as u64,
            _ => 0,
        };

        let avg_speed_kmh = if duration_seconds > 0 {
            (distance_km / (duration_seconds as f64)) * 3600.0
        } else {
            0.0
        };

        RouteSummary {
            distance_km,
            duration_seconds,
            avg_speed_kmh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_iso_and_epoch_timestamps_to_the_same_instant() {
        let iso = RawTimestamp::Iso("2024-05-01T10:00:00Z".to_string());
        let offset = RawTimestamp::Iso("2024-05-01T15:30:00+05:30".to_string());
        let naive = RawTimestamp::Iso("2024-05-01T10:00:00.000".to_string());
        let millis = RawTimestamp::EpochMillis(1_714_557_600_000);

        let expected = iso.normalize().expect("iso");
        assert_eq!(offset.normalize(), Some(expected));
        assert_eq!(naive.normalize(), Some(expected));
        assert_eq!(millis.normalize(), Some(expected));
    }

    #[test]
    fn rejects_garbage_timestamp_with_index() {
        let raw = RawRoutePoint {
            latitude: 1.0,
            longitude: 2.0,
            timestamp: RawTimestamp::Iso("yesterday".to_string()),
        };
        match raw.into_point(4) {
            Err(SourceError::InvalidTimestamp { index, value }) => {
                assert_eq!(index, 4);
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bounds_cover_all_points() {
        let t = Utc.timestamp_millis_opt(0).unwrap();
        let route = Route::new(vec![
            RoutePoint { latitude: 1.0, longitude: 5.0, timestamp: t },
            RoutePoint { latitude: -2.0, longitude: 7.0, timestamp: t },
            RoutePoint { latitude: 3.0, longitude: 6.0, timestamp: t },
        ]);
        assert_eq!(
            route.bounds(),
            Some(Bounds { min_lat: -2.0, min_lon: 5.0, max_lat: 3.0, max_lon: 7.0 })
        );
        assert_eq!(Route::default().bounds(), None);
    }

    #[test]
    fn summary_of_single_point_route_is_zero() {
        let t = Utc.timestamp_millis_opt(0).unwrap();
        let summary = Route::new(vec![RoutePoint { latitude: 1.0, longitude: 1.0, timestamp: t }]).summary();
        assert_eq!(summary.distance_km, 0.0);
        assert_eq!(summary.duration_seconds, 0);
        assert_eq!(summary.avg_speed_kmh, 0.0);
    }

    #[test]
    fn file_format_from_extension() {
        assert!(matches!(FileFormat::from_filename("dummy-route.JSON"), Some(FileFormat::Json)));
        assert!(matches!(FileFormat::from_filename("ride.gpx"), Some(FileFormat::Gpx)));
        assert!(matches!(FileFormat::from_filename("ride.fit"), Some(FileFormat::Fit)));
        assert!(FileFormat::from_filename("ride.txt").is_none());
    }
}
