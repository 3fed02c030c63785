//! Turns a `SceneFrame` into draw operations for a cell grid.
//!
//! Pure: the same frame, script and grid size always produce the same ops.
//! Fades and the hyperdrive white-out are applied last, as a colour grade
//! over everything that was drawn.

use std::f32::consts::TAU;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Script;
use crate::engine::particles::{ParticleKind, ParticleSample};
use crate::engine::phase::Phase;
use crate::engine::pointer::BackdropParams;
use crate::types::{Color, DrawOp, SceneFrame, Style};

/// Occupies the right half of a double-width glyph; never printed.
pub const WIDE_TAIL: char = '\0';

pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 20;

const VOID: Color = Color::rgb(5, 7, 18);
const PANEL: Color = Color::rgb(9, 13, 26);
const HOLO: Color = Color::rgb(79, 209, 255);
const CONSOLE: Color = Color::rgb(165, 243, 252);
const MUTED: Color = Color::rgb(120, 134, 156);
const WHITE: Color = Color::rgb(255, 255, 255);
const EMERALD: Color = Color::rgb(52, 211, 153);
const MARS: Color = Color::rgb(193, 68, 14);
const MARS_GLOW: Color = Color::rgb(255, 123, 58);
const DUST: Color = Color::rgb(255, 237, 213);
const HEART: Color = Color::rgb(251, 207, 232);
const SUNSET: Color = Color::rgb(43, 11, 22);

const Z_BACKGROUND: i32 = -100;
const Z_STARS: i32 = -20;
const Z_PLANET: i32 = -10;
const Z_PARTICLES: i32 = 5;
const Z_PANEL: i32 = 10;
const Z_TEXT: i32 = 12;

const SHADE_RAMP: [char; 10] = [' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

pub fn compose(frame: &SceneFrame, script: &Script, width: u16, height: u16) -> Vec<DrawOp> {
    let mut layout = Layout {
        script,
        width,
        height,
        ops: Vec::new(),
    };

    if let Some(backdrop) = &frame.backdrop {
        let center_x = match frame.scene {
            Phase::Choice => width as f32 * 0.27,
            _ => width as f32 / 2.0,
        };
        let radius = ((height as f32 / 2.0 - 1.0).min(width as f32 / 4.0 - 1.0) * 0.8).max(2.0);
        layout.stars(backdrop, frame.elapsed.as_secs_f32());
        layout.planet(backdrop, center_x, height as f32 / 2.0, radius);
    }

    match frame.scene {
        Phase::Intro => layout.console(frame),
        Phase::Choice => layout.boarding(frame),
        Phase::Transit => layout.hyperdrive(frame),
        Phase::Resolution => layout.landing(),
    }
    layout.particles(&frame.particles);
    layout.grade(frame.opacity, frame.flash);
    layout.ops
}

/// Greedy word wrap by display width. Words longer than `width` are broken.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_w = 0;

    for word in text.split_whitespace() {
        let word_w = word.width();
        if row_w > 0 && row_w + 1 + word_w > width {
            rows.push(std::mem::take(&mut row));
            row_w = 0;
        }
        if word_w > width {
            for grapheme in word.graphemes(true) {
                let g_w = grapheme.width();
                if row_w > 0 && row_w + g_w > width {
                    rows.push(std::mem::take(&mut row));
                    row_w = 0;
                }
                row.push_str(grapheme);
                row_w += g_w;
            }
            continue;
        }
        if row_w > 0 {
            row.push(' ');
            row_w += 1;
        }
        row.push_str(word);
        row_w += word_w;
    }
    if !row.is_empty() || rows.is_empty() {
        rows.push(row);
    }
    rows
}

/// H: hue (0-360), S: saturation (0-100), L: lightness (0-100)
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> Color {
    let h = h.rem_euclid(360.0);
    let s = s / 100.0;
    let l = l / 100.0;

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Color::rgb(
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    )
}

fn cell_hash(x: u16, y: u16) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x9E37_79B1) ^ (y as u32).wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h
}

fn on_panel(style: Style) -> Style {
    Style {
        bg: Some(PANEL),
        ..style
    }
}

struct Layout<'a> {
    script: &'a Script,
    width: u16,
    height: u16,
    ops: Vec<DrawOp>,
}

impl Layout<'_> {
    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    fn put(&mut self, x: i32, y: i32, ch: char, style: Style, z_order: i32) {
        self.put_glyph(x, y, ch, "", style, z_order);
    }

    fn put_glyph(&mut self, x: i32, y: i32, ch: char, marks: &str, style: Style, z_order: i32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        self.ops.push(DrawOp {
            x: x as u16,
            y: y as u16,
            ch,
            marks: marks.to_string(),
            style,
            z_order,
        });
    }

    /// Draw `text` from (x, y), clipped to `max_w` columns, one grapheme
    /// cluster per cell (two for wide ones). A cluster's zero-width code
    /// points ride along with its first char. Returns the columns used.
    fn text(&mut self, x: u16, y: u16, text: &str, style: Style, z_order: i32, max_w: u16) -> u16 {
        let mut col: u16 = 0;
        for grapheme in text.graphemes(true) {
            let mut chars = grapheme.chars();
            let Some(ch) = chars.next() else { continue };
            let w = grapheme.width().min(2) as u16;
            if w == 0 {
                continue;
            }
            if col + w > max_w {
                break;
            }
            let cx = x.saturating_add(col) as i32;
            self.put_glyph(cx, y as i32, ch, chars.as_str(), style, z_order);
            if w == 2 {
                self.put(cx + 1, y as i32, WIDE_TAIL, style, z_order);
            }
            col += w;
        }
        col
    }

    fn centered(&mut self, y: u16, text: &str, style: Style, z_order: i32) {
        let w = (text.width() as u16).min(self.width);
        let x = (self.width - w) / 2;
        self.text(x, y, text, style, z_order, self.width);
    }

    fn right_aligned(&mut self, right: u16, y: u16, text: &str, style: Style, z_order: i32) {
        let w = text.width() as u16;
        self.text(right.saturating_sub(w), y, text, style, z_order, w);
    }

    /// Bordered, filled box.
    fn panel(&mut self, x: u16, y: u16, w: u16, h: u16, border: Style) {
        if w < 2 || h < 2 {
            return;
        }
        let (x, y, w, h) = (x as i32, y as i32, w as i32, h as i32);
        let border = on_panel(border);
        let fill = on_panel(Style::default());

        self.put(x, y, '╭', border, Z_PANEL);
        self.put(x + w - 1, y, '╮', border, Z_PANEL);
        self.put(x, y + h - 1, '╰', border, Z_PANEL);
        self.put(x + w - 1, y + h - 1, '╯', border, Z_PANEL);
        for i in 1..w - 1 {
            self.put(x + i, y, '─', border, Z_PANEL);
            self.put(x + i, y + h - 1, '─', border, Z_PANEL);
        }
        for j in 1..h - 1 {
            self.put(x, y + j, '│', border, Z_PANEL);
            self.put(x + w - 1, y + j, '│', border, Z_PANEL);
            for i in 1..w - 1 {
                self.put(x + i, y + j, ' ', fill, Z_PANEL);
            }
        }
    }

    fn fill_rows(&mut self, color_for_row: impl Fn(f32) -> Color) {
        for y in 0..self.height {
            let t = y as f32 / self.height.saturating_sub(1).max(1) as f32;
            let style = Style {
                bg: Some(color_for_row(t)),
                ..Default::default()
            };
            for x in 0..self.width {
                self.put(x as i32, y as i32, ' ', style, Z_BACKGROUND);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Backdrop
    // -----------------------------------------------------------------------

    fn stars(&mut self, backdrop: &BackdropParams, seconds: f32) {
        let threshold = (backdrop.star_density.clamp(0.0, 1.0) * 10_000.0) as u32;
        let t = seconds * backdrop.star_speed;
        for y in 0..self.height {
            for x in 0..self.width {
                let h = cell_hash(x, y);
                if h % 10_000 >= threshold {
                    continue;
                }
                let phase = (h >> 16) as f32 / 65_535.0 * TAU;
                let twinkle = 0.55 + 0.45 * (t * 2.0 + phase).sin();
                let ch = match (h >> 8) & 0x7 {
                    0 => '*',
                    1 | 2 => '·',
                    _ => '.',
                };
                self.put(x as i32, y as i32, ch, Style::fg(WHITE.scaled(twinkle * 0.8)), Z_STARS);
            }
        }
    }

    /// Shaded sphere seen through the backdrop's orientation. Terminal
    /// cells are about twice as tall as wide, so x is stretched by two.
    fn planet(&mut self, backdrop: &BackdropParams, cx: f32, cy: f32, radius: f32) {
        let (sin_p, cos_p) = backdrop.pitch.sin_cos();
        let (sin_y, cos_y) = backdrop.yaw.sin_cos();
        let light = {
            let (lx, ly, lz) = (0.55f32, 0.45f32, 0.7f32);
            let len = (lx * lx + ly * ly + lz * lz).sqrt();
            (lx / len, ly / len, lz / len)
        };
        let rows = (radius * 1.12).ceil() as i32;

        for dy in -rows..=rows {
            for dx in -(rows * 2)..=(rows * 2) {
                let nx = dx as f32 / (2.0 * radius);
                let ny = dy as f32 / radius;
                let d2 = nx * nx + ny * ny;
                let (x, y) = (cx as i32 + dx, cy as i32 + dy);

                if d2 > 1.0 {
                    if d2 <= 1.25 {
                        let glow = 0.4 * (1.25 - d2) / 0.25;
                        self.put(x, y, '·', Style::fg(MARS_GLOW.scaled(glow)), Z_PLANET);
                    }
                    continue;
                }

                let (vx, vy, vz) = (nx, -ny, (1.0 - d2).sqrt());
                let (y1, z1) = (vy * cos_p + vz * sin_p, -vy * sin_p + vz * cos_p);
                let (x2, z2) = (vx * cos_y - z1 * sin_y, vx * sin_y + z1 * cos_y);
                let lon = x2.atan2(z2);
                let lat = y1.clamp(-1.0, 1.0).asin();

                let bands = (lon * 3.0 + (lat * 4.0).sin() * 1.3).sin() * 0.5 + 0.5;
                let craters = (lon * 7.0).cos() * (lat * 9.0).sin() * 0.5 + 0.5;
                let terrain = bands * 0.6 + craters * 0.4;
                let lit = (vx * light.0 + vy * light.1 + vz * light.2).max(0.0);
                let shade = (0.18 + 0.82 * lit) * (0.7 + 0.3 * terrain);

                let last = SHADE_RAMP.len() - 1;
                let idx = ((shade * last as f32).round() as usize).clamp(1, last);
                let color = MARS.mix(MARS_GLOW, terrain * 0.5).scaled(0.35 + 0.65 * shade);
                self.put(x, y, SHADE_RAMP[idx], Style::fg(color), Z_PLANET);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scenes
    // -----------------------------------------------------------------------

    fn console(&mut self, frame: &SceneFrame) {
        let script = self.script;
        let intro = &script.intro;
        let w = self.width.saturating_sub(8).min(78);
        let x = (self.width - w) / 2;
        let rows = u16::try_from(intro.lines.len()).unwrap_or(u16::MAX).max(1);
        let h = rows.saturating_add(10).min(self.height);
        // Console rows that fit between the status line and the footer.
        let capacity = usize::from(h.saturating_sub(10).max(1));
        let y = (self.height - h) / 2;
        let inner = w.saturating_sub(4);
        let blink_on = frame.elapsed.as_millis() / 500 % 2 == 0;

        self.panel(x, y, w, h, Style::fg(HOLO).dim());
        self.text(x + 2, y + 1, &intro.header, on_panel(Style::fg(HOLO).bold()), Z_TEXT, inner);
        self.right_aligned((x + w).saturating_sub(2), y + 1, &intro.version, on_panel(Style::fg(MUTED)), Z_TEXT);
        self.text(x + 2, y + 3, "●", on_panel(Style::fg(EMERALD)), Z_TEXT, 1);
        self.text(x + 4, y + 3, &intro.status, on_panel(Style::fg(CONSOLE)), Z_TEXT, inner.saturating_sub(2));

        let prompt_style = on_panel(Style::fg(HOLO).dim());
        let prompt_w = intro.prompt.width() as u16 + 1;
        let mut row = y + 5;
        let console = frame.console.clone().unwrap_or_default();
        if console.lines.is_empty() {
            self.text(x + 2, row, &intro.prompt, prompt_style, Z_TEXT, inner);
            if blink_on {
                self.text(x + 2 + prompt_w, row, "▌", on_panel(Style::fg(HOLO)), Z_TEXT, 1);
            }
        } else {
            let hidden = console.lines.len().saturating_sub(capacity);
            for line in &console.lines[hidden..] {
                self.text(x + 2, row, &intro.prompt, prompt_style, Z_TEXT, inner);
                let line_style = on_panel(Style::fg(CONSOLE));
                self.text(x + 2 + prompt_w, row, line, line_style, Z_TEXT, inner.saturating_sub(prompt_w));
                row += 1;
            }
            let pulse = 0.6 + 0.4 * (frame.elapsed.as_secs_f32() * TAU / 1.4).sin();
            self.text(x + 2, row + 1, "▌", on_panel(Style::fg(HOLO.scaled(pulse))), Z_TEXT, 1);
            let waiting = on_panel(Style::fg(CONSOLE.scaled(pulse * 0.8)));
            self.text(x + 4, row + 1, &intro.waiting, waiting, Z_TEXT, inner.saturating_sub(2));
        }

        let footer_y = (y + h).saturating_sub(2);
        self.text(x + 2, footer_y, &intro.footer_left, on_panel(Style::fg(MUTED)), Z_TEXT, inner / 2);
        self.right_aligned((x + w).saturating_sub(2), footer_y, &intro.footer_right, on_panel(Style::fg(MUTED)), Z_TEXT);
    }

    fn boarding(&mut self, frame: &SceneFrame) {
        let script = self.script;
        let choice = &script.choice;
        let half = self.width / 2;
        let left_w = half.saturating_sub(4);
        let mut y = 1;

        self.text(2, y, "●", Style::fg(EMERALD), Z_TEXT, 1);
        self.text(4, y, &choice.badge, Style::fg(MUTED), Z_TEXT, left_w);
        y += 2;
        self.text(2, y, &choice.title, Style::fg(WHITE).bold(), Z_TEXT, left_w);
        y += 1;
        for row in wrap(&choice.subtitle, left_w as usize) {
            self.text(2, y, &row, Style::fg(MUTED), Z_TEXT, left_w);
            y += 1;
        }
        y += 1;

        for passenger in &choice.passengers {
            if y + 4 > self.height {
                break;
            }
            self.panel(2, y, left_w, 4, Style::fg(WHITE).dim());
            self.text(4, y + 1, &passenger.name, on_panel(Style::fg(WHITE).bold()), Z_TEXT, left_w.saturating_sub(12));
            self.right_aligned(left_w.saturating_sub(1), y + 1, &passenger.seat, on_panel(Style::fg(HOLO)), Z_TEXT);
            self.text(4, y + 2, &passenger.role, on_panel(Style::fg(HOLO).dim()), Z_TEXT, left_w.saturating_sub(4));
            y += 4;
        }

        let px = half;
        let pw = self.width.saturating_sub(half + 2);
        let ph = self.height.saturating_sub(2);
        let inner = pw.saturating_sub(4);
        self.panel(px, 1, pw, ph, Style::fg(WHITE).dim());
        self.text(px + 2, 2, &choice.orbit, on_panel(Style::fg(MARS_GLOW)), Z_TEXT, inner);

        let button_y = (1 + ph).saturating_sub(4);
        let mut row = 4;
        'paragraphs: for paragraph in &choice.paragraphs {
            for line in wrap(paragraph, inner as usize) {
                if row + 1 >= button_y {
                    break 'paragraphs;
                }
                self.text(px + 2, row, &line, on_panel(Style::fg(WHITE.scaled(0.85))), Z_TEXT, inner);
                row += 1;
            }
            row += 1;
        }

        // Button with a shimmer sweeping across it every 2.6s.
        let label = format!("[Enter] ➜ {}", choice.action);
        let label_w = (label.width() as u16).min(inner);
        let bx = px + 2 + (inner - label_w) / 2;
        let sweep = (frame.elapsed.as_secs_f32() / 2.6).fract();
        let shimmer_col = bx as f32 - 4.0 + sweep * (label_w as f32 + 8.0);
        let mut col = 0u16;
        for ch in label.chars() {
            let ch_w = ch.width().unwrap_or(0) as u16;
            if ch_w == 0 || col + ch_w > label_w {
                continue;
            }
            let glow = 1.0 - ((bx + col) as f32 - shimmer_col).abs().min(4.0) / 4.0;
            let style = Style {
                fg: Some(VOID),
                bg: Some(HOLO.scaled(0.6).mix(WHITE, glow * 0.5)),
                bold: true,
                dim: false,
            };
            self.text(bx + col, button_y, &ch.to_string(), style, Z_TEXT, ch_w);
            col += ch_w;
        }
        self.text(px + 2, button_y + 1, &choice.hint_left, on_panel(Style::fg(MUTED)), Z_TEXT, inner / 2);
        self.right_aligned((px + pw).saturating_sub(2), button_y + 1, &choice.hint_right, on_panel(Style::fg(MUTED)), Z_TEXT);
    }

    fn hyperdrive(&mut self, frame: &SceneFrame) {
        let appear = (frame.elapsed.as_secs_f32() / 0.7).clamp(0.0, 1.0);
        let caption = self.script.transit.caption.clone();
        let color = Color::rgb(224, 242, 254).scaled(0.8 * appear);
        self.centered(self.height / 2, &caption, Style::fg(color).bold(), Z_TEXT);
    }

    fn landing(&mut self) {
        self.fill_rows(|t| VOID.mix(SUNSET, t * t));

        let script = self.script;
        let resolution = &script.resolution;
        let w = self.width.saturating_sub(10).min(72);
        let x = (self.width - w) / 2;
        let inner = w.saturating_sub(6);
        let headline = wrap(&resolution.headline, inner as usize);
        let message = wrap(&format!("{} {}", resolution.message, resolution.signature), inner as usize);
        let h = (headline.len() + message.len()) as u16 + 6;
        let y = self.height.saturating_sub(h) / 2;

        self.panel(x, y, w, h, Style::fg(WHITE).dim());
        let mut row = y + 1;
        for line in wrap(&resolution.header, inner as usize) {
            self.centered(row, &line, on_panel(Style::fg(MUTED)), Z_TEXT);
            row += 1;
        }
        row += 1;
        for line in &headline {
            self.centered(row, line, on_panel(Style::fg(WHITE).bold()), Z_TEXT);
            row += 1;
        }
        row += 1;
        for line in &message {
            self.centered(row, line, on_panel(Style::fg(HEART)), Z_TEXT);
            row += 1;
        }
    }

    fn particles(&mut self, samples: &[ParticleSample]) {
        let (w, h) = (self.width as f32, self.height as f32);
        for sample in samples {
            if sample.opacity < 0.04 {
                continue;
            }
            let x = ((sample.x / 100.0) * w).floor() as i32;
            match sample.kind {
                ParticleKind::Streak => {
                    let head = ((-0.1 + 1.4 * sample.travel) * h) as i32;
                    let len = (sample.size / 16.0).round().max(1.0) as i32;
                    let hue = sample.accent.unwrap_or(210.0);
                    for i in 0..len {
                        let falloff = 1.0 - i as f32 / (len as f32 + 1.0);
                        let color = hsl_to_rgb(hue, 100.0, 78.0).scaled(sample.opacity * falloff);
                        self.put(x, head - i, '│', Style::fg(color), Z_PARTICLES);
                    }
                }
                ParticleKind::Dust => {
                    let y = ((1.1 - 1.2 * sample.travel) * h) as i32;
                    let ch = match sample.size {
                        s if s < 3.0 => '·',
                        s if s < 4.0 => '•',
                        _ => '●',
                    };
                    self.put(x, y, ch, Style::fg(DUST.scaled(sample.opacity)), Z_PARTICLES);
                }
                ParticleKind::Glyph => {
                    let y = ((1.05 - 1.3 * sample.travel) * h) as i32;
                    let ch = if sample.accent.unwrap_or(1.0) >= 1.0 { '♥' } else { '♡' };
                    self.put(x, y, ch, Style::fg(HEART.scaled(sample.opacity)), Z_PARTICLES);
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Grading
    // -----------------------------------------------------------------------

    fn grade(&mut self, opacity: f32, flash: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        let flash = flash.clamp(0.0, 1.0);
        if flash > 0.0 {
            self.fill_rows(|_| VOID);
        }
        for op in &mut self.ops {
            op.style.fg = op.style.fg.map(|c| c.scaled(opacity).mix(WHITE, flash));
            op.style.bg = op.style.bg.map(|c| c.scaled(opacity).mix(WHITE, flash));
        }
    }
}
