//! Recording Context - Draw command log
//!
//! A [`Context2d`] that resolves every fill, stroke and text call into a
//! self-contained [`DrawCommand`] carrying the style that was in effect.
//! The log is what the JSON output and the renderer tests inspect.
//!
//! A clear anchored at the origin starts a new frame and discards the
//! previous one, so the log stays bounded across redraws.

use crate::context::{Context2d, FillRule, Font};
use crate::Color;
use glam::DVec2;
use serde::Serialize;
use tracing::warn;

/// One segment of a path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathOp {
    MoveTo { point: DVec2 },
    LineTo { point: DVec2 },
    Arc {
        center: DVec2,
        radius: f64,
        start: f64,
        end: f64,
    },
    Close,
}

/// Draw command for immediate-mode rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Fill {
        path: Vec<PathOp>,
        color: Color,
        rule: FillRule,
    },
    Stroke {
        path: Vec<PathOp>,
        color: Color,
        width: f64,
        dash: Vec<f64>,
    },
    Text {
        position: DVec2,
        text: String,
        font: Font,
        color: Color,
    },
}

/// Style state saved and restored by `save`/`restore`
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub fill: Color,
    pub stroke: Color,
    pub line_width: f64,
    pub dash: Vec<f64>,
    pub font: Font,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            stroke: Color::BLACK,
            line_width: 1.0,
            dash: Vec::new(),
            font: Font::default(),
        }
    }
}

/// Context that records draw commands instead of rasterizing
#[derive(Debug, Default)]
pub struct RecordingContext {
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<PathOp>,
    commands: Vec<DrawCommand>,
    frames: usize,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last frame started
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Commands recorded since the most recent clear (inclusive)
    pub fn last_frame(&self) -> &[DrawCommand] {
        let start = self
            .commands
            .iter()
            .rposition(|c| matches!(c, DrawCommand::Clear { .. }))
            .unwrap_or(0);
        &self.commands[start..]
    }

    /// Number of clears, i.e. render passes observed
    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Current save depth
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }
}

impl Context2d for RecordingContext {
    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(state) => self.state = state,
            None => warn!("restore() without matching save()"),
        }
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        if width > 0.0 && width.is_finite() {
            self.state.line_width = width;
        }
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.state.dash = segments.to_vec();
    }

    fn set_font(&mut self, font: &Font) {
        self.state.font = font.clone();
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if x <= 0.0 && y <= 0.0 {
            self.commands.clear();
        }
        self.frames += 1;
        self.commands.push(DrawCommand::Clear {
            x,
            y,
            width,
            height,
        });
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, point: DVec2) {
        self.path.push(PathOp::MoveTo { point });
    }

    fn line_to(&mut self, point: DVec2) {
        self.path.push(PathOp::LineTo { point });
    }

    fn arc(&mut self, center: DVec2, radius: f64, start: f64, end: f64) {
        self.path.push(PathOp::Arc {
            center,
            radius,
            start,
            end,
        });
    }

    fn close_path(&mut self) {
        if !self.path.is_empty() {
            self.path.push(PathOp::Close);
        }
    }

    fn fill(&mut self, rule: FillRule) {
        self.commands.push(DrawCommand::Fill {
            path: self.path.clone(),
            color: self.state.fill,
            rule,
        });
    }

    fn stroke(&mut self) {
        self.commands.push(DrawCommand::Stroke {
            path: self.path.clone(),
            color: self.state.stroke,
            width: self.state.line_width,
            dash: self.state.dash.clone(),
        });
    }

    fn fill_text(&mut self, text: &str, at: DVec2) {
        self.commands.push(DrawCommand::Text {
            position: at,
            text: text.to_string(),
            font: self.state.font.clone(),
            color: self.state.fill,
        });
    }
}
