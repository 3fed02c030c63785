//! Random particle fields for ambient motion.
//!
//! A field is drawn once when its scene mounts and then only *sampled*:
//! every frame derives each particle's visual state from the elapsed time,
//! so there are no per-particle timers to start or to stop.

use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::anim::{Ease, Keyframes};

/// Uniform range `[min, min + span)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub span: f32,
}

impl Span {
    pub const fn new(min: f32, span: f32) -> Self {
        Self { min, span }
    }

    pub const fn fixed(value: f32) -> Self {
        Self { min: value, span: 0.0 }
    }

    pub fn max(&self) -> f32 {
        self.min + self.span
    }

    pub fn draw(&self, rng: &mut fastrand::Rng) -> f32 {
        let value = self.min + rng.f32() * self.span;
        // f32 rounding can land exactly on the open upper bound.
        if self.span > 0.0 && value >= self.max() {
            return next_below(self.max());
        }
        value
    }

    pub fn contains(&self, value: f32) -> bool {
        if self.span == 0.0 {
            return value == self.min;
        }
        value >= self.min && value < self.max()
    }
}

fn next_below(x: f32) -> f32 {
    if x > 0.0 {
        f32::from_bits(x.to_bits() - 1)
    } else if x == 0.0 {
        -f32::from_bits(1)
    } else {
        f32::from_bits(x.to_bits() + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    /// Thin vertical light streak; `size` is its length.
    Streak,
    /// Small round mote; `size` is its diameter.
    Dust,
    /// A floating symbol; `accent` scales it.
    Glyph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Travel {
    Fall,
    Rise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub kind: ParticleKind,
    pub travel: Travel,
    pub looping: bool,
    pub position: Span,
    pub delay: Span,
    pub duration: Span,
    pub size: Span,
    pub opacity: Span,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<Span>,
    /// Opacity reached mid-flight, relative to the particle's own opacity.
    #[serde(default = "default_peak")]
    pub peak: f32,
}

fn default_peak() -> f32 {
    1.0
}

impl FieldConfig {
    /// Looping field with the given timing ranges and neutral visuals.
    pub fn timed(delay_max: f32, duration_min: f32, duration_span: f32) -> Self {
        Self {
            kind: ParticleKind::Dust,
            travel: Travel::Rise,
            looping: true,
            position: Span::new(0.0, 100.0),
            delay: Span::new(0.0, delay_max),
            duration: Span::new(duration_min, duration_span),
            size: Span::new(2.0, 3.0),
            opacity: Span::new(0.12, 0.25),
            accent: None,
            peak: 1.0,
        }
    }

    /// Hyperdrive light streaks: one pass, falling.
    pub fn streaks() -> Self {
        Self {
            kind: ParticleKind::Streak,
            travel: Travel::Fall,
            looping: false,
            position: Span::new(0.0, 100.0),
            delay: Span::new(0.0, 0.8),
            duration: Span::new(0.7, 0.3),
            size: Span::new(18.0, 40.0),
            opacity: Span::new(0.85, 0.1),
            accent: Some(Span::new(200.0, 40.0)),
            peak: 1.0,
        }
    }

    /// Rising surface dust.
    pub fn dust() -> Self {
        Self::timed(4.0, 10.0, 12.0)
    }

    /// Rising heart glyphs.
    pub fn glyphs() -> Self {
        Self {
            kind: ParticleKind::Glyph,
            travel: Travel::Rise,
            looping: true,
            position: Span::new(5.0, 90.0),
            delay: Span::new(0.0, 6.0),
            duration: Span::new(12.0, 10.0),
            size: Span::fixed(1.0),
            opacity: Span::new(0.6, 0.3),
            accent: Some(Span::new(0.6, 0.9)),
            peak: 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleDescriptor {
    /// Percent of the viewport width.
    pub horizontal_position: f32,
    /// Seconds before the first cycle starts.
    pub start_delay: f32,
    /// Seconds per cycle.
    pub cycle_duration: f32,
    pub size: f32,
    pub opacity: f32,
    pub accent: Option<f32>,
}

/// Draw `count` descriptors with independent uniform attributes.
pub fn generate(count: usize, config: &FieldConfig) -> Vec<ParticleDescriptor> {
    let mut rng = fastrand::Rng::new();
    (0..count)
        .map(|_| ParticleDescriptor {
            horizontal_position: config.position.draw(&mut rng),
            start_delay: config.delay.draw(&mut rng),
            cycle_duration: config.duration.draw(&mut rng),
            size: config.size.draw(&mut rng),
            opacity: config.opacity.draw(&mut rng),
            accent: config.accent.map(|accent| accent.draw(&mut rng)),
        })
        .collect()
}

/// Per-frame visual state of one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSample {
    pub kind: ParticleKind,
    /// Percent of the viewport width.
    pub x: f32,
    /// Distance travelled along the particle's path, `0..=1`.
    pub travel: f32,
    pub rising: bool,
    pub opacity: f32,
    pub size: f32,
    pub accent: Option<f32>,
}

impl ParticleDescriptor {
    /// Position within the current cycle, or `None` before the first cycle
    /// starts or after a one-shot particle has finished.
    pub fn cycle_progress(&self, elapsed: f32, looping: bool) -> Option<f32> {
        let local = elapsed - self.start_delay;
        if local < 0.0 || self.cycle_duration <= 0.0 {
            return None;
        }
        if looping {
            Some((local % self.cycle_duration) / self.cycle_duration)
        } else if local <= self.cycle_duration {
            Some(local / self.cycle_duration)
        } else {
            None
        }
    }
}

/// A mounted field: one memoized generation plus the time it was mounted.
#[derive(Debug, Clone)]
pub struct ParticleField {
    config: FieldConfig,
    descriptors: Rc<[ParticleDescriptor]>,
    mounted_at: Duration,
    opacity_curve: Keyframes,
}

impl ParticleField {
    pub fn mount(count: usize, config: FieldConfig, now: Duration) -> Self {
        let descriptors: Rc<[ParticleDescriptor]> = generate(count, &config).into();
        let ease = match config.travel {
            Travel::Fall => Ease::InOutQuad,
            Travel::Rise => Ease::OutQuad,
        };
        let opacity_curve = Keyframes::pulse(config.peak, ease);
        Self {
            config,
            descriptors,
            mounted_at: now,
            opacity_curve,
        }
    }

    pub fn descriptors(&self) -> &[ParticleDescriptor] {
        &self.descriptors
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn samples(&self, now: Duration) -> Vec<ParticleSample> {
        let elapsed = now.saturating_sub(self.mounted_at).as_secs_f32();
        let travel_ease = match self.config.travel {
            Travel::Fall => Ease::OutCubic,
            Travel::Rise => Ease::OutQuad,
        };
        self.descriptors
            .iter()
            .filter_map(|d| {
                let t = d.cycle_progress(elapsed, self.config.looping)?;
                Some(ParticleSample {
                    kind: self.config.kind,
                    x: d.horizontal_position,
                    travel: travel_ease.apply(t),
                    rising: self.config.travel == Travel::Rise,
                    opacity: d.opacity * self.opacity_curve.sample(t),
                    size: d.size,
                    accent: d.accent,
                })
            })
            .collect()
    }
}
