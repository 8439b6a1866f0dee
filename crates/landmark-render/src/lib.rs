//! Landmark Render - Canvas-style 2D drawing
//!
//! A minimal immediate-mode drawing layer for the landmark overlay:
//! a [`Context2d`] trait with scoped state, surfaces that publish
//! displayed-size changes, and two backends (a draw-command recorder
//! and an SVG document writer).

mod color;
mod context;
mod recorder;
mod surface;
mod svg;

pub use color::Color;
pub use context::{Context2d, DrawScope, FillRule, Font};
pub use recorder::{DrawCommand, DrawState, PathOp, RecordingContext};
pub use surface::{OffscreenSurface, Size, Surface, SurfaceResizer};
pub use svg::SvgContext;
