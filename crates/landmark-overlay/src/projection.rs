//! Coordinate projection
//!
//! Local equirectangular approximation around a reference origin:
//! longitude is compressed by the cosine of the origin latitude, then
//! both axes are scaled and centred on the surface. Only accurate near
//! the origin.

use crate::feature::Coordinate;
use glam::DVec2;
use landmark_render::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference frame errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error("scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    #[error("origin must be finite, got ({lon}, {lat})")]
    InvalidOrigin { lon: f64, lat: f64 },
}

/// Origin and scale of the geographic-to-pixel mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceFrame {
    /// Origin longitude in degrees
    #[serde(alias = "lon")]
    pub origin_lon: f64,
    /// Origin latitude in degrees
    #[serde(alias = "lat")]
    pub origin_lat: f64,
    /// Pixels per degree (latitude axis)
    pub scale: f64,
}

impl ReferenceFrame {
    /// Athens, centred between the Acropolis and the Agora
    pub const ATHENS: ReferenceFrame = ReferenceFrame {
        origin_lon: 23.72,
        origin_lat: 37.97,
        scale: 12000.0,
    };

    pub fn new(origin_lon: f64, origin_lat: f64, scale: f64) -> Result<Self, FrameError> {
        let frame = Self {
            origin_lon,
            origin_lat,
            scale,
        };
        frame.validate()?;
        Ok(frame)
    }

    pub fn validate(&self) -> Result<(), FrameError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(FrameError::InvalidScale(self.scale));
        }
        if !(self.origin_lon.is_finite() && self.origin_lat.is_finite()) {
            return Err(FrameError::InvalidOrigin {
                lon: self.origin_lon,
                lat: self.origin_lat,
            });
        }
        Ok(())
    }
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self::ATHENS
    }
}

/// Projector bound to one frame and surface size
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    origin: DVec2,
    center: DVec2,
    /// Per-axis pixels per degree, y negated (screen y grows downward)
    factor: DVec2,
}

impl Projector {
    pub fn new(frame: &ReferenceFrame, size: Size) -> Self {
        let lon_compression = (frame.origin_lat * std::f64::consts::PI / 180.0).cos();
        Self {
            origin: DVec2::new(frame.origin_lon, frame.origin_lat),
            center: DVec2::new(size.width as f64 / 2.0, size.height as f64 / 2.0),
            factor: DVec2::new(lon_compression * frame.scale, -frame.scale),
        }
    }

    pub fn project(&self, coordinate: Coordinate) -> DVec2 {
        let offset = DVec2::new(coordinate.lon, coordinate.lat) - self.origin;
        self.center + offset * self.factor
    }
}

/// Map a geographic coordinate to surface pixels
pub fn project(coordinate: Coordinate, frame: &ReferenceFrame, size: Size) -> DVec2 {
    Projector::new(frame, size).project(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: Size = Size::new(640, 480);

    #[test]
    fn test_origin_maps_to_center() {
        let frame = ReferenceFrame::ATHENS;
        let p = project(Coordinate::new(23.72, 37.97), &frame, SIZE);
        assert_eq!(p, DVec2::new(320.0, 240.0));
    }

    #[test]
    fn test_acropolis() {
        let frame = ReferenceFrame::ATHENS;
        let p = project(Coordinate::new(23.7255, 37.9715), &frame, SIZE);
        let expected_x = 320.0 + 0.0055 * (37.97f64.to_radians()).cos() * 12000.0;
        assert!((p.x - expected_x).abs() < 1e-6);
        assert!((p.x - 372.0).abs() < 1.0);
        assert!((p.y - 222.0).abs() < 1e-6);
    }

    #[test]
    fn test_north_is_up_and_east_is_right() {
        let frame = ReferenceFrame::ATHENS;
        let origin = project(Coordinate::new(23.72, 37.97), &frame, SIZE);
        let north_east = project(Coordinate::new(23.73, 37.98), &frame, SIZE);
        assert!(north_east.x > origin.x);
        assert!(north_east.y < origin.y);
    }

    #[test]
    fn test_small_moves_stay_small() {
        let frame = ReferenceFrame::ATHENS;
        let a = project(Coordinate::new(23.7200, 37.9700), &frame, SIZE);
        let b = project(Coordinate::new(23.7200001, 37.9700001), &frame, SIZE);
        assert!(a.distance(b) < 0.01);
    }

    #[test]
    fn test_deterministic() {
        let frame = ReferenceFrame::new(0.0, 0.0, 100.0).unwrap();
        let c = Coordinate::new(1.5, -2.5);
        assert_eq!(project(c, &frame, SIZE), project(c, &frame, SIZE));
        assert_eq!(project(c, &frame, SIZE), DVec2::new(470.0, 490.0));
    }

    #[test]
    fn test_frame_validation() {
        assert_eq!(
            ReferenceFrame::new(23.72, 37.97, 0.0),
            Err(FrameError::InvalidScale(0.0))
        );
        assert!(ReferenceFrame::new(23.72, 37.97, -5.0).is_err());
        assert!(ReferenceFrame::new(f64::NAN, 37.97, 1.0).is_err());
        assert!(ReferenceFrame::default().validate().is_ok());
    }
}
