//! Pointer → backdrop orientation.
//!
//! The input handler writes the latest normalized pointer position into a
//! `PointerCell`; the backdrop reads it once per render tick and eases its
//! tilt toward it while spinning on its own.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::clock::CancelToken;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerVector {
    pub x: f32,
    pub y: f32,
}

/// Map an absolute pointer position to `[-1, 1]²` with +y pointing up.
/// Positions outside the viewport are clamped to its edge.
pub fn normalize(column: f32, row: f32, width: f32, height: f32) -> PointerVector {
    let axis = |pos: f32, extent: f32| {
        if extent <= 0.0 || !pos.is_finite() {
            return 0.0;
        }
        ((pos / extent) * 2.0 - 1.0).clamp(-1.0, 1.0)
    };
    PointerVector {
        x: axis(column, width),
        y: -axis(row, height),
    }
}

/// Single-slot mailbox for the latest pointer position. Clones share the
/// slot; the last write wins.
#[derive(Debug, Clone, Default)]
pub struct PointerCell(Rc<Cell<PointerVector>>);

impl PointerCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, vector: PointerVector) {
        self.0.set(vector);
    }

    pub fn read(&self) -> PointerVector {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackdropTuning {
    /// Autonomous spin, radians per second.
    pub spin_rate: f32,
    /// Tilt reached at the edge of the viewport, radians.
    pub reach: f32,
    /// Share of the remaining distance closed each tick.
    pub smoothing: f32,
}

impl Default for BackdropTuning {
    fn default() -> Self {
        Self {
            spin_rate: 0.04,
            reach: 0.25,
            smoothing: 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    /// Smoothed tilt about the horizontal axis, follows pointer y.
    pub tilt_x: f32,
    /// Smoothed lean about the vertical axis, follows pointer x.
    pub tilt_y: f32,
    /// Accumulated autonomous rotation.
    pub spin: f32,
}

impl Orientation {
    pub fn pitch(&self) -> f32 {
        self.tilt_x
    }

    pub fn yaw(&self) -> f32 {
        self.spin + self.tilt_y
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// One render tick of the backdrop.
pub fn orient(prev: Orientation, pointer: PointerVector, dt: f32, tuning: &BackdropTuning) -> Orientation {
    Orientation {
        tilt_x: lerp(prev.tilt_x, pointer.y * tuning.reach, tuning.smoothing),
        tilt_y: lerp(prev.tilt_y, pointer.x * tuning.reach, tuning.smoothing),
        spin: prev.spin + dt.max(0.0) * tuning.spin_rate,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackdropParams {
    pub pitch: f32,
    pub yaw: f32,
    /// Fraction of sky cells that carry a star.
    pub star_density: f32,
    /// Twinkle speed multiplier.
    pub star_speed: f32,
}

/// The rotating planet behind a scene. Owns its smoothed orientation and a
/// handle on the pointer cell for as long as it is mounted.
#[derive(Debug)]
pub struct Backdrop {
    pointer: PointerCell,
    tuning: BackdropTuning,
    orientation: Orientation,
    orbit: bool,
    token: CancelToken,
}

impl Backdrop {
    pub fn mount(pointer: PointerCell, tuning: BackdropTuning, orbit: bool) -> Self {
        Self {
            pointer,
            tuning,
            orientation: Orientation::default(),
            orbit,
            token: CancelToken::new(),
        }
    }

    pub fn pointer(&self) -> &PointerCell {
        &self.pointer
    }

    pub fn is_mounted(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Advance one render tick. After `unmount` this is a no-op and the
    /// pointer cell is no longer read.
    pub fn tick(&mut self, dt: f32) -> Option<Orientation> {
        if self.token.is_cancelled() {
            return None;
        }
        self.orientation = orient(self.orientation, self.pointer.read(), dt, &self.tuning);
        Some(self.orientation)
    }

    pub fn unmount(&self) {
        self.token.cancel();
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn params(&self) -> BackdropParams {
        let (star_density, star_speed) = if self.orbit { (0.034, 1.0) } else { (0.026, 0.3) };
        BackdropParams {
            pitch: self.orientation.pitch(),
            yaw: self.orientation.yaw(),
            star_density,
            star_speed,
        }
    }
}
