//! Crossterm implementation of the `Renderer` boundary.
//!
//! The scene fills the terminal except for the bottom row, which carries
//! the key hints. Only cells that changed since the previous paint are
//! written.

use std::io::{self, Write};
use std::rc::Rc;

use crossterm::{cursor, queue, style, terminal};

use crate::config::Script;
use crate::engine::phase::Phase;
use crate::error::{PresenterError, PresenterResult};
use crate::types::{Color, NamedColor, SceneFrame, Style};

use super::layout::{MIN_HEIGHT, MIN_WIDTH, WIDE_TAIL, compose};
use super::{Canvas, Renderer};

/// Rows reserved below the scene for the hint bar.
const HINT_ROWS: u16 = 1;

const HINTS: &[&str] = &["[Enter][Space] next", "[r] restart", "[q][Esc] quit"];
const FALLBACK_HINTS: &[&str] = &["[r] restart", "[q] quit"];

pub struct TerminalRenderer<W: Write = io::Stdout> {
    out: W,
    script: Rc<Script>,
    canvas: Canvas,
    width: u16,
    height: u16,
    /// Scene and input state the hint bar was last drawn for.
    hint: Option<(Phase, bool)>,
}

impl TerminalRenderer<io::Stdout> {
    /// Renderer over stdout, sized to the current terminal.
    pub fn stdout(script: Rc<Script>) -> PresenterResult<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::new(io::stdout(), script, width, height))
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, script: Rc<Script>, width: u16, height: u16) -> Self {
        Self {
            out,
            script,
            canvas: Canvas::new(),
            width,
            height,
            hint: None,
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.invalidate();
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render_hints(&mut self, frame: &SceneFrame) -> PresenterResult<()> {
        let key = (frame.scene, frame.accepts_input);
        if self.hint == Some(key) {
            return Ok(());
        }
        let y = self.height - HINT_ROWS;
        queue!(
            self.out,
            cursor::MoveTo(0, y),
            style::ResetColor,
            terminal::Clear(terminal::ClearType::CurrentLine),
            style::Print(" "),
        )?;
        for (i, item) in HINTS.iter().enumerate() {
            if i > 0 {
                queue!(self.out, style::Print("  "))?;
            }
            print_menu_item(&mut self.out, item)?;
        }

        let mut status = format!(" {} ", frame.scene);
        if !frame.accepts_input {
            status = format!(" … {}", status.trim_start());
        }
        let status_x = self.width.saturating_sub(status.chars().count() as u16);
        let mut cs = style::ContentStyle::default();
        cs.attributes.set(style::Attribute::Dim);
        queue!(
            self.out,
            cursor::MoveTo(status_x, y),
            style::PrintStyledContent(style::StyledContent::new(cs, status)),
        )?;
        self.hint = Some(key);
        Ok(())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn paint(&mut self, frame: &SceneFrame) -> PresenterResult<()> {
        if self.width < MIN_WIDTH || self.height < MIN_HEIGHT + HINT_ROWS {
            return Err(PresenterError::render_fault(format!(
                "terminal too small: need {}x{}, have {}x{}",
                MIN_WIDTH,
                MIN_HEIGHT + HINT_ROWS,
                self.width,
                self.height,
            )));
        }

        let scene_height = self.height - HINT_ROWS;
        let ops = compose(frame, &self.script, self.width, scene_height);
        let changes = self.canvas.update(&ops, self.width, scene_height);

        for change in changes {
            if change.cell.ch == WIDE_TAIL {
                continue;
            }
            let cs = to_content_style(&change.cell.style);
            queue!(self.out, cursor::MoveTo(change.x, change.y))?;
            if change.cell.marks.is_empty() {
                queue!(
                    self.out,
                    style::PrintStyledContent(style::StyledContent::new(cs, change.cell.ch)),
                )?;
            } else {
                queue!(
                    self.out,
                    style::PrintStyledContent(style::StyledContent::new(cs, change.cell.glyph())),
                )?;
            }
        }
        self.render_hints(frame)?;
        self.out.flush()?;
        Ok(())
    }

    fn paint_fallback(&mut self, message: &str) -> PresenterResult<()> {
        self.invalidate();
        let center = self.height / 2;
        let message_x = self.width.saturating_sub(message.chars().count() as u16) / 2;
        let hint_width = FALLBACK_HINTS.iter().map(|h| h.chars().count() as u16 + 2).sum::<u16>();
        let hint_x = self.width.saturating_sub(hint_width) / 2;

        queue!(
            self.out,
            style::ResetColor,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(message_x, center.saturating_sub(1)),
            style::PrintStyledContent(style::StyledContent::new(
                to_content_style(&Style::fg(Color::Named(NamedColor::Red)).bold()),
                message,
            )),
            cursor::MoveTo(hint_x, center.saturating_add(1)),
        )?;
        for (i, item) in FALLBACK_HINTS.iter().enumerate() {
            if i > 0 {
                queue!(self.out, style::Print("  "))?;
            }
            print_menu_item(&mut self.out, item)?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn invalidate(&mut self) {
        self.canvas.invalidate();
        self.hint = None;
    }
}

/// Print a hint string, bolding any text inside `[...]` brackets.
/// Text outside brackets is printed dim.
fn print_menu_item<W: Write>(out: &mut W, item: &str) -> io::Result<()> {
    let mut rest = item;
    while !rest.is_empty() {
        let Some(open) = rest.find('[') else {
            queue!(
                out,
                style::SetAttribute(style::Attribute::Dim),
                style::Print(rest),
                style::SetAttribute(style::Attribute::Reset),
            )?;
            break;
        };
        if open > 0 {
            queue!(
                out,
                style::SetAttribute(style::Attribute::Dim),
                style::Print(&rest[..open]),
                style::SetAttribute(style::Attribute::Reset),
            )?;
        }
        rest = &rest[open..];
        match rest.find(']') {
            Some(close) => {
                queue!(
                    out,
                    style::SetAttribute(style::Attribute::Bold),
                    style::Print(&rest[..=close]),
                    style::SetAttribute(style::Attribute::Reset),
                )?;
                rest = &rest[close + 1..];
            }
            None => {
                queue!(out, style::Print(rest))?;
                break;
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Style conversion
// ---------------------------------------------------------------------------

pub fn to_content_style(s: &Style) -> style::ContentStyle {
    let mut cs = style::ContentStyle::default();
    if let Some(fg) = &s.fg {
        cs.foreground_color = Some(to_ct_color(fg));
    }
    if let Some(bg) = &s.bg {
        cs.background_color = Some(to_ct_color(bg));
    }
    if s.bold {
        cs.attributes.set(style::Attribute::Bold);
    }
    if s.dim {
        cs.attributes.set(style::Attribute::Dim);
    }
    cs
}

pub fn to_ct_color(c: &Color) -> style::Color {
    match *c {
        Color::Named(n) => match n {
            NamedColor::Black => style::Color::Black,
            NamedColor::Red => style::Color::Red,
            NamedColor::Green => style::Color::Green,
            NamedColor::Yellow => style::Color::Yellow,
            NamedColor::Blue => style::Color::Blue,
            NamedColor::Magenta => style::Color::Magenta,
            NamedColor::Cyan => style::Color::Cyan,
            NamedColor::White => style::Color::White,
        },
        Color::Rgb { r, g, b } => style::Color::Rgb { r, g, b },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConsoleView;

    fn renderer(width: u16, height: u16) -> TerminalRenderer<Vec<u8>> {
        TerminalRenderer::new(Vec::new(), Rc::new(Script::default()), width, height)
    }

    fn shown(scene: Phase) -> SceneFrame {
        let mut frame = SceneFrame::blank(scene);
        frame.opacity = 1.0;
        frame.accepts_input = true;
        frame
    }

    #[test]
    fn too_small_is_a_render_fault() {
        let mut r = renderer(MIN_WIDTH - 1, 40);
        let err = r.paint(&shown(Phase::Resolution)).unwrap_err();
        assert!(err.is_render_fault());
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn repeated_frames_write_less() {
        let mut r = renderer(80, 24);
        let frame = shown(Phase::Resolution);
        r.paint(&frame).unwrap();
        let first = r.out.len();
        r.paint(&frame).unwrap();
        let second = r.out.len() - first;
        assert!(first > 0);
        assert!(second < first / 10, "second paint wrote {second} bytes");
    }

    #[test]
    fn invalidate_forces_a_full_redraw() {
        let mut r = renderer(80, 24);
        let frame = shown(Phase::Resolution);
        r.paint(&frame).unwrap();
        let first = r.out.len();
        r.invalidate();
        r.paint(&frame).unwrap();
        assert!(r.out.len() - first >= first / 2);
    }

    #[test]
    fn combining_marks_reach_the_terminal() {
        let mut r = renderer(80, 24);
        let mut frame = shown(Phase::Intro);
        frame.console = Some(ConsoleView {
            lines: vec!["cafe\u{301}".into()],
            completed: false,
        });
        r.paint(&frame).unwrap();
        let text = String::from_utf8_lossy(&r.into_inner()).into_owned();
        assert!(text.contains("e\u{301}"));
    }

    #[test]
    fn fallback_shows_message_and_restart_hint() {
        let mut r = renderer(80, 24);
        r.paint_fallback("render fault: boom").unwrap();
        let text = String::from_utf8_lossy(&r.into_inner()).into_owned();
        assert!(text.contains("render fault: boom"));
        assert!(text.contains("[r]"));
        assert!(text.contains("restart"));
    }

    #[test]
    fn fallback_works_in_tiny_terminals() {
        let mut r = renderer(10, 3);
        assert!(r.paint_fallback("render fault: terminal too small").is_ok());
    }
}
