//! Mounted scenes: the resources one phase holds while it is on screen.
//!
//! A scene owns everything its phase started: the backdrop and its pointer
//! cell, the typewriter run handle, particle fields, and phase timers. It
//! is torn down as a whole before the next scene is mounted.

use std::time::Duration;

use super::clock::{CancelToken, TimerId};
use super::particles::{ParticleField, ParticleSample};
use super::phase::Phase;
use super::pointer::Backdrop;
use super::typewriter::RunHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub(crate) u64);

#[derive(Debug)]
pub enum SceneContent {
    Intro { backdrop: Backdrop, run: RunHandle },
    Choice { backdrop: Backdrop },
    Transit { streaks: ParticleField, arrival: TimerId },
    Resolution { dust: ParticleField, glyphs: ParticleField },
}

#[derive(Debug)]
pub struct MountedScene {
    pub id: SceneId,
    pub phase: Phase,
    pub mounted_at: Duration,
    pub token: CancelToken,
    pub content: SceneContent,
}

impl MountedScene {
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    pub fn backdrop(&self) -> Option<&Backdrop> {
        match &self.content {
            SceneContent::Intro { backdrop, .. } | SceneContent::Choice { backdrop } => Some(backdrop),
            _ => None,
        }
    }

    pub fn backdrop_mut(&mut self) -> Option<&mut Backdrop> {
        match &mut self.content {
            SceneContent::Intro { backdrop, .. } | SceneContent::Choice { backdrop } => Some(backdrop),
            _ => None,
        }
    }

    pub fn elapsed(&self, now: Duration) -> Duration {
        now.saturating_sub(self.mounted_at)
    }

    pub fn particles(&self, now: Duration) -> Vec<ParticleSample> {
        match &self.content {
            SceneContent::Transit { streaks, .. } => streaks.samples(now),
            SceneContent::Resolution { dust, glyphs } => {
                let mut samples = dust.samples(now);
                samples.extend(glyphs.samples(now));
                samples
            }
            _ => Vec::new(),
        }
    }
}
