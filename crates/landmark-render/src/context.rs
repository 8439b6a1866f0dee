//! 2D Drawing Context
//!
//! A canvas-style immediate-mode drawing API. Backends implement
//! [`Context2d`]; callers wrap each logical shape in a [`DrawScope`]
//! so style and path state never leak between shapes.

use crate::Color;
use glam::DVec2;
use serde::Serialize;
use std::ops::{Deref, DerefMut};

/// Fill rule used when filling a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

impl FillRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }
}

/// Font used for label text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    /// Size in pixels
    pub size: f64,
    /// Family list, most preferred first
    pub family: String,
}

impl Font {
    pub const DEFAULT_FAMILY: &'static str = "\"Inter\", system-ui, sans-serif";

    pub fn new(size: f64) -> Self {
        Self {
            size,
            family: Self::DEFAULT_FAMILY.to_string(),
        }
    }

    pub fn with_family(mut self, family: &str) -> Self {
        self.family = family.to_string();
        self
    }

    /// CSS shorthand, e.g. `12px "Inter", system-ui, sans-serif`
    pub fn to_css(&self) -> String {
        format!("{}px {}", self.size, self.family)
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new(10.0).with_family("sans-serif")
    }
}

/// Canvas-style 2D drawing context.
///
/// Style setters affect subsequent fill/stroke/text calls until the
/// enclosing `save`/`restore` pair unwinds them. The current path is
/// built with `move_to`/`line_to`/`arc` and consumed by `fill`/`stroke`
/// (which do not clear it, matching canvas semantics).
pub trait Context2d {
    fn save(&mut self);
    fn restore(&mut self);

    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);
    /// Empty slice means solid lines
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_font(&mut self, font: &Font);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, point: DVec2);
    fn line_to(&mut self, point: DVec2);
    /// Clockwise arc (in y-down space) from `start` to `end` radians
    fn arc(&mut self, center: DVec2, radius: f64, start: f64, end: f64);
    fn close_path(&mut self);

    fn fill(&mut self, rule: FillRule);
    fn stroke(&mut self);
    fn fill_text(&mut self, text: &str, at: DVec2);
}

/// Scoped drawing state.
///
/// Entering saves the context state and starts a fresh path; dropping
/// the scope restores the saved state, so every attribute set through
/// the scope is reset before the next shape is drawn.
pub struct DrawScope<'a, C: Context2d + ?Sized> {
    ctx: &'a mut C,
}

impl<'a, C: Context2d + ?Sized> DrawScope<'a, C> {
    pub fn enter(ctx: &'a mut C) -> Self {
        ctx.save();
        ctx.begin_path();
        Self { ctx }
    }
}

impl<C: Context2d + ?Sized> Deref for DrawScope<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.ctx
    }
}

impl<C: Context2d + ?Sized> DerefMut for DrawScope<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.ctx
    }
}

impl<C: Context2d + ?Sized> Drop for DrawScope<'_, C> {
    fn drop(&mut self) {
        self.ctx.restore();
    }
}
