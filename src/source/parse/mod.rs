mod fit;
mod gpx;
mod json;

use crate::error::SourceError;
use crate::types::route::{FileFormat, Route};

pub trait Parser {
    fn parse(&self, bytes: &[u8]) -> Result<Route, SourceError>;
}

pub fn parse(bytes: &[u8], format: FileFormat) -> Result<Route, SourceError> {
    match format {
        FileFormat::Json => json::JsonParser.parse(bytes),
        FileFormat::Gpx => gpx::GpxParser.parse(bytes),
        FileFormat::Fit => fit::FitParser.parse(bytes),
    }
}
