//! Geometry renderer
//!
//! Draws one feature at a time onto a [`Context2d`]. Each feature is
//! drawn inside its own [`DrawScope`], so fill, stroke, dash, font and
//! path state are all reset before the next feature.

use crate::feature::{Coordinate, Feature, Geometry};
use crate::labels::LabelResolver;
use crate::projection::{Projector, ReferenceFrame};
use glam::DVec2;
use landmark_render::{Color, Context2d, DrawScope, FillRule, Font, Size};
use std::f64::consts::TAU;

/// Text appearance for one geometry kind
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub font: Font,
    pub color: Color,
}

/// Colors, widths and fonts for every geometry kind
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStyle {
    pub marker_color: Color,
    pub marker_radius: f64,
    pub point_label: LabelStyle,

    pub line_color: Color,
    pub line_width: f64,
    pub line_dash: Vec<f64>,
    pub line_label: LabelStyle,

    pub polygon_fill: Color,
    pub polygon_stroke: Color,
    pub polygon_line_width: f64,
    pub polygon_label: LabelStyle,

    /// Label position relative to its anchor point
    pub label_offset: DVec2,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        Self {
            marker_color: Color::from_hex(0xef4444),
            marker_radius: 4.0,
            point_label: LabelStyle {
                font: Font::new(12.0),
                color: Color::rgba8(17, 24, 39, 0.92),
            },

            line_color: Color::from_hex(0x2563eb),
            line_width: 2.0,
            line_dash: vec![6.0, 4.0],
            line_label: LabelStyle {
                font: Font::new(11.0),
                color: Color::rgba8(30, 64, 175, 0.92),
            },

            polygon_fill: Color::rgba8(96, 165, 250, 0.18),
            polygon_stroke: Color::rgba8(59, 130, 246, 0.8),
            polygon_line_width: 1.5,
            polygon_label: LabelStyle {
                font: Font::new(11.0),
                color: Color::rgba8(37, 99, 235, 0.95),
            },

            label_offset: DVec2::new(6.0, -6.0),
        }
    }
}

/// Draws features by geometry kind
#[derive(Debug, Clone, Default)]
pub struct GeometryRenderer {
    style: FeatureStyle,
    labels: LabelResolver,
}

impl GeometryRenderer {
    pub fn new(style: FeatureStyle, labels: LabelResolver) -> Self {
        Self { style, labels }
    }

    pub fn style(&self) -> &FeatureStyle {
        &self.style
    }

    pub fn labels(&self) -> &LabelResolver {
        &self.labels
    }

    /// Draw one feature. Returns false when there was nothing to draw
    /// (missing or unknown geometry, empty coordinates).
    pub fn draw<C: Context2d + ?Sized>(
        &self,
        ctx: &mut C,
        feature: &Feature,
        size: Size,
        frame: &ReferenceFrame,
    ) -> bool {
        let projector = Projector::new(frame, size);
        match &feature.geometry {
            Some(Geometry::Point(coordinate)) => {
                self.draw_point(ctx, feature, *coordinate, &projector);
                true
            }
            Some(Geometry::LineString(coordinates)) => {
                self.draw_line(ctx, feature, coordinates, &projector)
            }
            Some(Geometry::Polygon(rings)) => self.draw_polygon(ctx, feature, rings, &projector),
            Some(Geometry::Other(_)) | None => false,
        }
    }

    fn draw_point<C: Context2d + ?Sized>(
        &self,
        ctx: &mut C,
        feature: &Feature,
        coordinate: Coordinate,
        projector: &Projector,
    ) {
        let center = projector.project(coordinate);
        let mut scope = DrawScope::enter(ctx);

        scope.set_fill_style(self.style.marker_color);
        scope.arc(center, self.style.marker_radius, 0.0, TAU);
        scope.fill(FillRule::NonZero);

        let label = self.labels.resolve(feature, false);
        self.draw_label(&mut *scope, &label, center, &self.style.point_label);
    }

    fn draw_line<C: Context2d + ?Sized>(
        &self,
        ctx: &mut C,
        feature: &Feature,
        coordinates: &[Coordinate],
        projector: &Projector,
    ) -> bool {
        if coordinates.is_empty() {
            return false;
        }
        let mut scope = DrawScope::enter(ctx);

        scope.set_stroke_style(self.style.line_color);
        scope.set_line_width(self.style.line_width);
        scope.set_line_dash(&self.style.line_dash);
        trace_path(&mut *scope, coordinates, projector);
        scope.stroke();
        scope.set_line_dash(&[]);

        let midpoint = projector.project(coordinates[coordinates.len() / 2]);
        let label = self.labels.resolve(feature, true);
        self.draw_label(&mut *scope, &label, midpoint, &self.style.line_label);
        true
    }

    fn draw_polygon<C: Context2d + ?Sized>(
        &self,
        ctx: &mut C,
        feature: &Feature,
        rings: &[Vec<Coordinate>],
        projector: &Projector,
    ) -> bool {
        if rings.is_empty() {
            return false;
        }
        let mut scope = DrawScope::enter(ctx);

        scope.set_fill_style(self.style.polygon_fill);
        scope.set_stroke_style(self.style.polygon_stroke);
        scope.set_line_width(self.style.polygon_line_width);
        // All rings share one path and one fill/stroke; holes are not
        // subtracted.
        for ring in rings {
            trace_path(&mut *scope, ring, projector);
        }
        scope.close_path();
        scope.fill(FillRule::NonZero);
        scope.stroke();

        if let Some(centroid) = centroid(&rings[0]) {
            let anchor = projector.project(centroid);
            let label = self.labels.resolve(feature, false);
            self.draw_label(&mut *scope, &label, anchor, &self.style.polygon_label);
        }
        true
    }

    fn draw_label<C: Context2d + ?Sized>(
        &self,
        ctx: &mut C,
        text: &str,
        anchor: DVec2,
        style: &LabelStyle,
    ) {
        if text.is_empty() {
            return;
        }
        ctx.set_font(&style.font);
        ctx.set_fill_style(style.color);
        ctx.fill_text(text, anchor + self.style.label_offset);
    }
}

/// Add one projected polyline to the current path
fn trace_path<C: Context2d + ?Sized>(ctx: &mut C, coordinates: &[Coordinate], projector: &Projector) {
    for (idx, coordinate) in coordinates.iter().enumerate() {
        let point = projector.project(*coordinate);
        if idx == 0 {
            ctx.move_to(point);
        } else {
            ctx.line_to(point);
        }
    }
}

/// Arithmetic mean of raw coordinates (not area-weighted)
fn centroid(ring: &[Coordinate]) -> Option<Coordinate> {
    if ring.is_empty() {
        return None;
    }
    let n = ring.len() as f64;
    let (lon, lat) = ring
        .iter()
        .fold((0.0, 0.0), |(lon, lat), c| (lon + c.lon, lat + c.lat));
    Some(Coordinate::new(lon / n, lat / n))
}
