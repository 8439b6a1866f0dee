//! Landmark Overlay - Labeled historical landmarks on a 2D surface
//!
//! Loads GeoJSON-shaped feature layers, projects them with a local
//! equirectangular approximation and draws markers, dashed lines,
//! filled polygons and short labels.
//!
//! # Architecture
//!
//! ```text
//! OverlayController
//!   ├── FeatureStore      primary + secondary layers
//!   ├── GeometryRenderer  one DrawScope per feature
//!   │     ├── Projector
//!   │     └── LabelResolver
//!   └── Surface           redraw on displayed-size change
//! ```

mod feature;
mod geometry;
mod labels;
mod options;
mod overlay;
mod projection;
mod registry;
mod store;

pub use feature::{Coordinate, Feature, FeatureCollection, FeatureParseError, FeatureProperties, Geometry};
pub use geometry::{FeatureStyle, GeometryRenderer, LabelStyle};
pub use labels::{LabelDictionary, LabelResolver};
pub use options::{ConfigFormat, OptionsError, RenderOptions, DEFAULT_PRIMARY_SOURCE};
pub use overlay::{OverlayController, OverlayError, OverlayPhase, SizeSubscription, FALLBACK_SIZE};
pub use projection::{project, FrameError, Projector, ReferenceFrame};
pub use registry::{create_landmark_overlay, OverlayRegistry, LANDMARK_OVERLAY};
pub use store::{ActiveFeatures, FeatureStore, LoadError};
