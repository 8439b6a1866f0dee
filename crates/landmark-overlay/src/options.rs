//! Render options
//!
//! Options can be built in code or read from a TOML or JSON file. The
//! camelCase keys used by browser-side embeddings (`geoJsonUrl`,
//! `agoraDataUrl`, `showAgoraLayer`, `bounds`) are accepted as aliases.

use crate::projection::{FrameError, ReferenceFrame};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Primary source used when none is configured
pub const DEFAULT_PRIMARY_SOURCE: &str = "./data/athens_places.geojson";

/// Options errors
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid reference frame: {0}")]
    InvalidFrame(#[from] FrameError),
}

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, OptionsError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Ok(ConfigFormat::Toml),
            "json" => Ok(ConfigFormat::Json),
            _ => Err(OptionsError::UnsupportedFormat(ext.to_string())),
        }
    }
}

/// Overlay configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Location of the required feature layer
    #[serde(alias = "geoJsonUrl", skip_serializing_if = "Option::is_none")]
    pub primary_source: Option<String>,
    /// Location of the optional feature layer
    #[serde(alias = "agoraDataUrl", skip_serializing_if = "Option::is_none")]
    pub secondary_source: Option<String>,
    /// Whether the optional layer is loaded and drawn
    #[serde(alias = "showAgoraLayer")]
    pub secondary_layer_enabled: bool,
    #[serde(alias = "bounds")]
    pub reference_frame: ReferenceFrame,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            primary_source: Some(DEFAULT_PRIMARY_SOURCE.to_string()),
            secondary_source: None,
            secondary_layer_enabled: false,
            reference_frame: ReferenceFrame::ATHENS,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_source(mut self, location: impl Into<String>) -> Self {
        self.primary_source = Some(location.into());
        self
    }

    /// Set the secondary source and enable the layer
    pub fn with_secondary_source(mut self, location: impl Into<String>) -> Self {
        self.secondary_source = Some(location.into());
        self.secondary_layer_enabled = true;
        self
    }

    pub fn with_secondary_layer(mut self, enabled: bool) -> Self {
        self.secondary_layer_enabled = enabled;
        self
    }

    pub fn with_reference_frame(mut self, frame: ReferenceFrame) -> Self {
        self.reference_frame = frame;
        self
    }

    /// Parse from TOML
    pub fn from_toml(content: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    /// Parse from JSON
    pub fn from_json(content: &str) -> Result<Self, OptionsError> {
        let options: Self = serde_json::from_str(content)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_str_with(content: &str, format: ConfigFormat) -> Result<Self, OptionsError> {
        match format {
            ConfigFormat::Toml => Self::from_toml(content),
            ConfigFormat::Json => Self::from_json(content),
        }
    }

    /// Load from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self, OptionsError> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_str_with(&content, format)
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        self.reference_frame.validate()?;
        Ok(())
    }

    /// Primary location, if one is set and non-empty
    pub fn primary_location(&self) -> Option<&str> {
        self.primary_source.as_deref().filter(|s| !s.is_empty())
    }

    /// Secondary location, only when the layer is enabled
    pub fn secondary_location(&self) -> Option<&str> {
        if !self.secondary_layer_enabled {
            return None;
        }
        self.secondary_source.as_deref().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.primary_location(), Some(DEFAULT_PRIMARY_SOURCE));
        assert!(!options.secondary_layer_enabled);
        assert_eq!(options.secondary_location(), None);
        assert_eq!(options.reference_frame, ReferenceFrame::ATHENS);
    }

    #[test]
    fn test_from_toml() {
        let options = RenderOptions::from_toml(
            r#"
            primary_source = "places.geojson"
            secondary_source = "agora.geojson"
            secondary_layer_enabled = true

            [reference_frame]
            scale = 8000.0
            "#,
        )
        .unwrap();

        assert_eq!(options.primary_location(), Some("places.geojson"));
        assert_eq!(options.secondary_location(), Some("agora.geojson"));
        assert_eq!(options.reference_frame.scale, 8000.0);
        assert_eq!(options.reference_frame.origin_lon, 23.72);
    }

    #[test]
    fn test_from_json_aliases() {
        let options = RenderOptions::from_json(
            r#"{
                "geoJsonUrl": "https://example.org/athens.geojson",
                "agoraDataUrl": "agora.geojson",
                "showAgoraLayer": false,
                "bounds": { "lon": 23.7, "lat": 37.9, "scale": 10000 }
            }"#,
        )
        .unwrap();

        assert_eq!(
            options.primary_location(),
            Some("https://example.org/athens.geojson")
        );
        assert_eq!(options.secondary_location(), None);
        assert_eq!(options.reference_frame, ReferenceFrame::new(23.7, 37.9, 10000.0).unwrap());
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let result = RenderOptions::from_toml("[reference_frame]\nscale = 0.0\n");
        assert!(matches!(result, Err(OptionsError::InvalidFrame(_))));
    }

    #[test]
    fn test_empty_locations_are_absent() {
        let options = RenderOptions::new()
            .with_primary_source("")
            .with_secondary_source("");
        assert_eq!(options.primary_location(), None);
        assert_eq!(options.secondary_location(), None);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("overlay.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("overlay.JSON")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("overlay.yaml")).is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let options = RenderOptions::new().with_secondary_source("agora.geojson");
        let parsed = RenderOptions::from_toml(&options.to_toml()).unwrap();
        assert_eq!(parsed, options);
    }

    #[test]
    fn test_from_missing_file() {
        let result = RenderOptions::from_file(Path::new("/nonexistent/overlay.toml"));
        assert!(matches!(result, Err(OptionsError::Io { .. })));
    }
}
