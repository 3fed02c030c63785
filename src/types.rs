//! Shared boundary types.
//!
//! - Engine → Renderer: `SceneFrame`, the numeric and textual parameters of
//!   one frame. Renderers never see timers, scenes or the phase machine.
//! - Renderer internals: `DrawOp`s rasterized onto a `Cell` grid.

use std::time::Duration;

use crate::engine::particles::ParticleSample;
use crate::engine::phase::Phase;
use crate::engine::pointer::BackdropParams;

// ---------------------------------------------------------------------------
// Engine → Renderer boundary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleView {
    pub lines: Vec<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    /// Phase of the scene being shown. During an exit this is the outgoing
    /// scene, not the phase the controller has already moved to.
    pub scene: Phase,
    pub opacity: f32,
    pub accepts_input: bool,
    /// Time since the scene was mounted.
    pub elapsed: Duration,
    pub backdrop: Option<BackdropParams>,
    pub console: Option<ConsoleView>,
    pub particles: Vec<ParticleSample>,
    /// White-out intensity, `0..=1`.
    pub flash: f32,
}

impl SceneFrame {
    pub fn blank(scene: Phase) -> Self {
        SceneFrame {
            scene,
            opacity: 0.0,
            accepts_input: false,
            elapsed: Duration::ZERO,
            backdrop: None,
            console: None,
            particles: Vec::new(),
            flash: 0.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Style primitives
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Named(NamedColor),
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb { r, g, b }
    }

    /// Darken toward black; terminals have no alpha, so opacity is brightness.
    pub fn scaled(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * f).round() as u8;
        match self {
            Color::Rgb { r, g, b } => Color::rgb(scale(r), scale(g), scale(b)),
            named if f >= 0.5 => named,
            _ => Color::Named(NamedColor::Black),
        }
    }

    /// Linear blend toward `other`.
    pub fn mix(self, other: Color, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        match (self, other) {
            (Color::Rgb { r, g, b }, Color::Rgb { r: r2, g: g2, b: b2 }) => {
                let blend = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
                Color::rgb(blend(r, r2), blend(g, g2), blend(b, b2))
            }
            (a, b) => {
                if t < 0.5 {
                    a
                } else {
                    b
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
}

impl Style {
    pub fn fg(color: Color) -> Self {
        Style {
            fg: Some(color),
            ..Default::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn dim(mut self) -> Self {
        self.dim = true;
        self
    }

    pub fn is_default(&self) -> bool {
        self.fg.is_none() && self.bg.is_none() && !self.bold && !self.dim
    }
}

// ---------------------------------------------------------------------------
// Rasterization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DrawOp {
    pub x: u16,
    pub y: u16,
    pub ch: char,
    /// Zero-width code points that belong to `ch`'s grapheme cluster
    /// (combining marks, variation selectors, joiners).
    pub marks: String,
    pub style: Style,
    pub z_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub marks: String,
    pub style: Style,
}

impl Cell {
    /// Terminal output for this cell: the base char followed by its marks.
    pub fn glyph(&self) -> String {
        let mut glyph = String::with_capacity(self.ch.len_utf8() + self.marks.len());
        glyph.push(self.ch);
        glyph.push_str(&self.marks);
        glyph
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            marks: String::new(),
            style: Style::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaling_rgb_darkens() {
        assert_eq!(Color::rgb(200, 100, 0).scaled(0.5), Color::rgb(100, 50, 0));
        assert_eq!(Color::rgb(200, 100, 0).scaled(0.0), Color::rgb(0, 0, 0));
    }

    #[test]
    fn glyph_keeps_marks_after_the_base() {
        let cell = Cell {
            ch: 'e',
            marks: "\u{301}".into(),
            ..Cell::default()
        };
        assert_eq!(cell.glyph(), "e\u{301}");
        assert_eq!(Cell::default().glyph(), " ");
    }

    #[test]
    fn mixing_reaches_the_target() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(255, 255, 255);
        assert_eq!(a.mix(b, 1.0), b);
        assert_eq!(a.mix(b, 0.0), a);
    }
}
