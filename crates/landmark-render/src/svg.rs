//! SVG Context - Vector document backend
//!
//! Renders the canvas-style API into an SVG document. Each fill,
//! stroke and text call becomes one element with its style inlined.

use crate::context::{Context2d, FillRule, Font};
use crate::recorder::DrawState;
use crate::{Color, Size};
use glam::DVec2;
use std::f64::consts::TAU;
use std::fmt::Write;
use tracing::{debug, warn};

/// Context that accumulates SVG elements
#[derive(Debug)]
pub struct SvgContext {
    state: DrawState,
    stack: Vec<DrawState>,
    /// Path data (`d` attribute) for the current path
    path: String,
    /// Whether the current path has a current point
    has_point: bool,
    elements: Vec<String>,
    viewport: Size,
    background: Color,
}

impl SvgContext {
    pub fn new(viewport: Size) -> Self {
        Self {
            state: DrawState::default(),
            stack: Vec::new(),
            path: String::new(),
            has_point: false,
            elements: Vec::new(),
            viewport,
            background: Color::WHITE,
        }
    }

    /// Color painted by partial clears
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Serialize the current document
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.viewport.width,
            h = self.viewport.height,
        );
        for element in &self.elements {
            out.push_str("  ");
            out.push_str(element);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }

    fn push_point(&mut self, cmd: char, p: DVec2) {
        if !self.path.is_empty() {
            self.path.push(' ');
        }
        let _ = write!(self.path, "{} {} {}", cmd, fmt(p.x), fmt(p.y));
        self.has_point = true;
    }

    fn paint(&self, fill: &str, stroke: &str) -> String {
        format!(r#"<path d="{}" {} {}/>"#, self.path, fill, stroke)
    }
}

impl Context2d for SvgContext {
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
        // A clear anchored at the origin starts a new document.
        if x <= 0.0 && y <= 0.0 {
            debug!("SVG document reset ({}x{})", width, height);
            self.elements.clear();
            self.viewport = Size::new(width.max(0.0) as u32, height.max(0.0) as u32);
            return;
        }
        self.elements.push(format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            fmt(x),
            fmt(y),
            fmt(width),
            fmt(height),
            self.background.to_css()
        ));
    }

    fn begin_path(&mut self) {
        self.path.clear();
        self.has_point = false;
    }

    fn move_to(&mut self, point: DVec2) {
        self.push_point('M', point);
    }

    fn line_to(&mut self, point: DVec2) {
        if self.has_point {
            self.push_point('L', point);
        } else {
            self.push_point('M', point);
        }
    }

    fn arc(&mut self, center: DVec2, radius: f64, start: f64, end: f64) {
        let at = |angle: f64| center + DVec2::new(angle.cos(), angle.sin()) * radius;
        let first = at(start);
        if self.has_point {
            self.push_point('L', first);
        } else {
            self.push_point('M', first);
        }

        let sweep = end - start;
        if sweep >= TAU {
            // Full circle: two half arcs, SVG cannot express one closed arc.
            let opposite = at(start + TAU / 2.0);
            let r = fmt(radius);
            let _ = write!(
                self.path,
                " A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {}",
                fmt(opposite.x),
                fmt(opposite.y),
                fmt(first.x),
                fmt(first.y),
            );
        } else if sweep > 0.0 {
            let last = at(end);
            let large = if sweep > TAU / 2.0 { 1 } else { 0 };
            let r = fmt(radius);
            let _ = write!(
                self.path,
                " A {r} {r} 0 {large} 1 {} {}",
                fmt(last.x),
                fmt(last.y)
            );
        }
    }

    fn close_path(&mut self) {
        if self.has_point {
            self.path.push_str(" Z");
        }
    }

    fn fill(&mut self, rule: FillRule) {
        if self.path.is_empty() {
            return;
        }
        let fill = format!(
            r#"fill="{}" fill-rule="{}""#,
            self.state.fill.to_css(),
            rule.as_str()
        );
        let element = self.paint(&fill, r#"stroke="none""#);
        self.elements.push(element);
    }

    fn stroke(&mut self) {
        if self.path.is_empty() {
            return;
        }
        let mut stroke = format!(
            r#"stroke="{}" stroke-width="{}""#,
            self.state.stroke.to_css(),
            fmt(self.state.line_width)
        );
        if !self.state.dash.is_empty() {
            let dash: Vec<String> = self.state.dash.iter().map(|d| fmt(*d)).collect();
            let _ = write!(stroke, r#" stroke-dasharray="{}""#, dash.join(" "));
        }
        let element = self.paint(r#"fill="none""#, &stroke);
        self.elements.push(element);
    }

    fn fill_text(&mut self, text: &str, at: DVec2) {
        self.elements.push(format!(
            r#"<text x="{}" y="{}" font-size="{}" font-family="{}" fill="{}">{}</text>"#,
            fmt(at.x),
            fmt(at.y),
            fmt(self.state.font.size),
            escape(&self.state.font.family),
            self.state.fill.to_css(),
            escape(text)
        ));
    }
}

/// Trim coordinates to two decimals
fn fmt(v: f64) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    if rounded == 0.0 {
        // avoid "-0"
        return "0".to_string();
    }
    format!("{}", rounded)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashed_stroke() {
        let mut ctx = SvgContext::new(Size::new(100, 100));
        ctx.set_stroke_style(Color::from_hex(0x2563eb));
        ctx.set_line_width(2.0);
        ctx.set_line_dash(&[6.0, 4.0]);
        ctx.move_to(DVec2::new(1.0, 2.0));
        ctx.line_to(DVec2::new(3.5, 4.25));
        ctx.stroke();

        let svg = ctx.to_svg();
        assert!(svg.contains(r#"d="M 1 2 L 3.5 4.25""#));
        assert!(svg.contains(r#"stroke-dasharray="6 4""#));
        assert!(svg.contains(r#"stroke-width="2""#));
    }

    #[test]
    fn test_full_circle() {
        let mut ctx = SvgContext::new(Size::new(100, 100));
        ctx.arc(DVec2::new(10.0, 10.0), 4.0, 0.0, TAU);
        ctx.fill(FillRule::NonZero);

        let svg = ctx.to_svg();
        assert!(svg.contains("M 14 10 A 4 4 0 1 1 6 10 A 4 4 0 1 1 14 10"));
        assert!(svg.contains(r#"fill-rule="nonzero""#));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut ctx = SvgContext::new(Size::new(100, 100));
        ctx.fill_text("Hadrian's <Library>", DVec2::new(5.0, 5.0));
        assert!(ctx.to_svg().contains("Hadrian&apos;s &lt;Library&gt;"));
    }

    #[test]
    fn test_origin_clear_resets_document() {
        let mut ctx = SvgContext::new(Size::new(100, 100));
        ctx.fill_text("old", DVec2::ZERO);
        ctx.clear_rect(0.0, 0.0, 320.0, 200.0);

        assert_eq!(ctx.element_count(), 0);
        assert!(ctx.to_svg().contains(r#"width="320" height="200""#));
    }

    #[test]
    fn test_partial_clear_paints_background() {
        let mut ctx = SvgContext::new(Size::new(100, 100));
        ctx.clear_rect(10.0, 10.0, 5.0, 5.0);
        assert_eq!(ctx.element_count(), 1);
    }
}
