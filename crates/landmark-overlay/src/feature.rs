//! Feature data model
//!
//! Features are decoded from GeoJSON-shaped documents. Decoding is
//! lenient at the collection level: a document without a `features`
//! array is an empty collection, and a feature that fails to decode is
//! skipped without affecting its neighbours.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Feature decoding errors
#[derive(Debug, Error)]
pub enum FeatureParseError {
    #[error("feature is not an object")]
    NotAnObject,

    #[error("position needs longitude and latitude, got {0} values")]
    InvalidPosition(usize),

    #[error("invalid {kind} coordinates: {source}")]
    Coordinates {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "Vec<f64>")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = FeatureParseError;

    /// GeoJSON positions are `[lon, lat]` with an optional altitude
    fn try_from(position: Vec<f64>) -> Result<Self, Self::Error> {
        match position.as_slice() {
            [lon, lat, ..] => Ok(Self::new(*lon, *lat)),
            _ => Err(FeatureParseError::InvalidPosition(position.len())),
        }
    }
}

/// Feature geometry
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// Rings; the first is the outer boundary
    Polygon(Vec<Vec<Coordinate>>),
    /// Any geometry type this overlay does not draw
    Other(String),
}

impl Geometry {
    pub fn kind(&self) -> &str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::Other(kind) => kind,
        }
    }

    fn from_value(value: &Value) -> Result<Option<Self>, FeatureParseError> {
        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Ok(None);
        };
        let coordinates = value.get("coordinates").cloned().unwrap_or(Value::Null);

        let geometry = match kind {
            "Point" => Geometry::Point(decode("Point", coordinates)?),
            "LineString" => Geometry::LineString(decode_or_empty("LineString", coordinates)?),
            "Polygon" => Geometry::Polygon(decode_or_empty("Polygon", coordinates)?),
            other => Geometry::Other(other.to_string()),
        };
        Ok(Some(geometry))
    }
}

fn decode<T: for<'de> Deserialize<'de>>(
    kind: &'static str,
    value: Value,
) -> Result<T, FeatureParseError> {
    serde_json::from_value(value).map_err(|source| FeatureParseError::Coordinates { kind, source })
}

/// Missing coordinates on a line or polygon mean "nothing to draw"
fn decode_or_empty<T: for<'de> Deserialize<'de>>(
    kind: &'static str,
    value: Value,
) -> Result<Vec<T>, FeatureParseError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    decode(kind, value)
}

/// Descriptive properties; empty strings count as absent
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureProperties {
    pub name: Option<String>,
    pub short: Option<String>,
    pub title: Option<String>,
}

impl FeatureProperties {
    fn from_value(value: Option<&Value>) -> Self {
        let text = |key: &str| {
            value
                .and_then(|props| props.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            name: text("name"),
            short: text("short"),
            title: text("title"),
        }
    }
}

/// One labeled shape
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry: Some(geometry),
            properties: FeatureProperties::default(),
        }
    }

    pub fn point(lon: f64, lat: f64) -> Self {
        Self::new(Geometry::Point(Coordinate::new(lon, lat)))
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.properties.name = Some(name.to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_short(mut self, short: &str) -> Self {
        self.properties.short = Some(short.to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.properties.title = Some(title.to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.name.as_deref()
    }

    pub fn is_line(&self) -> bool {
        matches!(self.geometry, Some(Geometry::LineString(_)))
    }

    /// Decode one element of a `features` array
    pub fn from_value(value: &Value) -> Result<Self, FeatureParseError> {
        if !value.is_object() {
            return Err(FeatureParseError::NotAnObject);
        }
        let geometry = match value.get("geometry") {
            Some(geometry) if geometry.is_object() => Geometry::from_value(geometry)?,
            _ => None,
        };
        Ok(Self {
            geometry,
            properties: FeatureProperties::from_value(value.get("properties")),
        })
    }
}

/// Ordered features loaded from one source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whole document. Only invalid JSON is an error.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_slice(bytes)?;
        Ok(Self::from_document(&document))
    }

    pub fn from_document(document: &Value) -> Self {
        let Some(items) = document.get("features").and_then(Value::as_array) else {
            debug!("Document has no features array, treating as empty");
            return Self::new();
        };

        let mut features = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match Feature::from_value(item) {
                Ok(feature) => features.push(feature),
                Err(e) => debug!("Skipping feature {}: {}", index, e),
            }
        }
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }
}

impl From<Vec<Feature>> for FeatureCollection {
    fn from(features: Vec<Feature>) -> Self {
        Self { features }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_mixed_geometries() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "geometry": { "type": "Point", "coordinates": [23.7255, 37.9715] },
                    "properties": { "name": "Acropolis" }
                },
                {
                    "geometry": { "type": "LineString", "coordinates": [[23.70, 37.95], [23.65, 37.94, 12.0]] },
                    "properties": { "name": "Long Walls (Piraeus)" }
                },
                {
                    "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
                    "properties": {}
                }
            ]
        });
        let collection = FeatureCollection::from_document(&doc);
        assert_eq!(collection.len(), 3);

        let kinds: Vec<&str> = collection
            .iter()
            .map(|f| f.geometry.as_ref().unwrap().kind())
            .collect();
        assert_eq!(kinds, vec!["Point", "LineString", "Polygon"]);
        assert_eq!(collection.iter().next().unwrap().name(), Some("Acropolis"));

        // altitude is ignored
        match &collection.iter().nth(1).unwrap().geometry {
            Some(Geometry::LineString(coords)) => {
                assert_eq!(coords[1], Coordinate::new(23.65, 37.94));
            }
            other => panic!("Expected LineString, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_features_is_empty() {
        let collection = FeatureCollection::from_slice(br#"{"type": "FeatureCollection"}"#).unwrap();
        assert!(collection.is_empty());

        let collection = FeatureCollection::from_slice(br#"{"features": "nope"}"#).unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(FeatureCollection::from_slice(b"<html>404</html>").is_err());
    }

    #[test]
    fn test_unknown_geometry_kept_as_other() {
        let doc = json!({
            "features": [
                { "geometry": { "type": "MultiPoint", "coordinates": [[0, 0]] } }
            ]
        });
        let collection = FeatureCollection::from_document(&doc);
        assert_eq!(
            collection.iter().next().unwrap().geometry,
            Some(Geometry::Other("MultiPoint".to_string()))
        );
    }

    #[test]
    fn test_bad_feature_is_skipped() {
        let doc = json!({
            "features": [
                42,
                { "geometry": { "type": "Point", "coordinates": [1.0] } },
                { "geometry": { "type": "Point", "coordinates": [1.0, 2.0] } }
            ]
        });
        let collection = FeatureCollection::from_document(&doc);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_missing_geometry_and_line_coordinates() {
        let doc = json!({
            "features": [
                { "properties": { "name": "Nowhere" } },
                { "geometry": { "type": "LineString" } },
                { "geometry": { "coordinates": [0, 0] } }
            ]
        });
        let collection = FeatureCollection::from_document(&doc);
        let features: Vec<&Feature> = collection.iter().collect();
        assert_eq!(features.len(), 3);
        assert_eq!(features[0].geometry, None);
        assert_eq!(features[1].geometry, Some(Geometry::LineString(Vec::new())));
        assert_eq!(features[2].geometry, None);
    }

    #[test]
    fn test_empty_and_non_string_properties_are_absent() {
        let doc = json!({
            "features": [
                {
                    "geometry": { "type": "Point", "coordinates": [0, 0] },
                    "properties": { "name": "", "short": 7, "title": "Stoa" }
                }
            ]
        });
        let collection = FeatureCollection::from_document(&doc);
        let props = &collection.iter().next().unwrap().properties;
        assert_eq!(props.name, None);
        assert_eq!(props.short, None);
        assert_eq!(props.title.as_deref(), Some("Stoa"));
    }
}
