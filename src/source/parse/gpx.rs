use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SourceError;
use crate::source::parse::Parser;
use crate::types::route::{Route, RoutePoint};

pub struct GpxParser;

struct PendingPoint {
    lat: f64,
    lon: f64,
    time: Option<DateTime<Utc>>,
}

impl Parser for GpxParser {
    fn parse(&self, bytes: &[u8]) -> Result<Route, SourceError> {
        let mut reader = Reader::from_reader(bytes);
        reader.trim_text(true);

        let mut points = Vec::new();
        let mut current_point: Option<PendingPoint> = None;
        let mut current_element = String::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name_str = element_name(&e)?;
                    if is_point_element(&name_str) {
                        current_point = read_position(&e)?;
                    } else if current_point.is_some() {
                        current_element = name_str;
                    }
                }
                Ok(Event::Empty(e)) => {
                    // A self-closing point cannot carry a <time> child.
                    if is_point_element(&element_name(&e)?) {
                        if let Some(point) = read_position(&e)? {
                            points.push(finish(point, points.len())?);
                        }
                    }
                }
                Ok(Event::Text(e)) => {
                    if let Some(point) = current_point.as_mut() {
                        if current_element == "time" {
                            let text = e
                                .unescape()
                                .map_err(|e| SourceError::InvalidGpx(e.to_string()))?;
                            point.time = text.parse::<DateTime<Utc>>().ok();
                        }
                    }
                }
                Ok(Event::End(e)) => {
                    let name = e.name();
                    let name_str = std::str::from_utf8(name.as_ref())
                        .map_err(|e| SourceError::InvalidGpx(e.to_string()))?;

                    if is_point_element(name_str) {
                        if let Some(point) = current_point.take() {
                            points.push(finish(point, points.len())?);
                        }
                    }
                    current_element.clear();
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(SourceError::InvalidGpx(e.to_string())),
                _ => {}
            }
            buf.clear();
        }

        if points.is_empty() {
            return Err(SourceError::EmptyFile);
        }

        Ok(Route::new(points))
    }
}

// Route points (rtept) carry the same shape as track points.
fn is_point_element(name: &str) -> bool {
    name == "trkpt" || name == "rtept"
}

fn element_name(e: &BytesStart<'_>) -> Result<String, SourceError> {
    let name = e.name();
    std::str::from_utf8(name.as_ref())
        .map(str::to_string)
        .map_err(|e| SourceError::InvalidGpx(e.to_string()))
}

fn read_position(e: &BytesStart<'_>) -> Result<Option<PendingPoint>, SourceError> {
    let mut lat = None;
    let mut lon = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|e| SourceError::InvalidGpx(e.to_string()))?;
        let value = std::str::from_utf8(&attr.value)
            .map_err(|e| SourceError::InvalidGpx(e.to_string()))?;

        match attr.key.as_ref() {
            b"lat" => lat = value.parse().ok(),
            b"lon" => lon = value.parse().ok(),
            _ => {}
        }
    }

    Ok(match (lat, lon) {
        (Some(lat), Some(lon)) => Some(PendingPoint { lat, lon, time: None }),
        _ => None,
    })
}

fn finish(point: PendingPoint, index: usize) -> Result<RoutePoint, SourceError> {
    let timestamp = point.time.ok_or(SourceError::MissingTimestamp(index))?;
    Ok(RoutePoint {
        latitude: point.lat,
        longitude: point.lon,
        timestamp,
    })
}
