use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Fraction of `duration` covered by `elapsed`, clamped to `[0, 1]`.
/// A zero duration is already complete.
pub fn progress(elapsed: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
}

/// Piecewise-linear keyframes over normalized time, eased per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframes {
    values: Vec<f32>,
    times: Vec<f32>,
    ease: Ease,
}

impl Keyframes {
    /// Evenly spaced keyframes.
    pub fn even(values: &[f32], ease: Ease) -> Self {
        let last = values.len().saturating_sub(1).max(1) as f32;
        let times = (0..values.len()).map(|i| i as f32 / last).collect();
        Self {
            values: values.to_vec(),
            times,
            ease,
        }
    }

    /// Keyframes at explicit normalized times; `times` must be ascending and
    /// the same length as `values`.
    pub fn timed(values: &[f32], times: &[f32], ease: Ease) -> Self {
        debug_assert_eq!(values.len(), times.len());
        Self {
            values: values.to_vec(),
            times: times.to_vec(),
            ease,
        }
    }

    /// `[0, peak, 0]`: fade in, then out.
    pub fn pulse(peak: f32, ease: Ease) -> Self {
        Self::even(&[0.0, peak, 0.0], ease)
    }

    pub fn sample(&self, t: f32) -> f32 {
        let Some(&first) = self.values.first() else {
            return 0.0;
        };
        let t = t.clamp(0.0, 1.0);
        for i in 1..self.values.len() {
            let (t0, t1) = (self.times[i - 1], self.times[i]);
            if t <= t1 {
                let span = t1 - t0;
                let local = if span <= f32::EPSILON { 1.0 } else { (t - t0) / span };
                let (a, b) = (self.values[i - 1], self.values[i]);
                return a + (b - a) * self.ease.apply(local);
            }
        }
        self.values.last().copied().unwrap_or(first)
    }
}

/// Scene opacity over one enter or exit stage. An exit starts from
/// whatever opacity the scene had when it was interrupted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fade {
    In { started: Duration, duration: Duration },
    Out { started: Duration, duration: Duration, from: f32 },
}

impl Fade {
    pub fn opacity(&self, now: Duration) -> f32 {
        match *self {
            Fade::In { started, duration } => {
                Ease::OutCubic.apply(progress(now.saturating_sub(started), duration))
            }
            Fade::Out { started, duration, from } => {
                from * (1.0 - Ease::OutCubic.apply(progress(now.saturating_sub(started), duration)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Ease; 6] = [
        Ease::Linear,
        Ease::InQuad,
        Ease::OutQuad,
        Ease::InOutQuad,
        Ease::InCubic,
        Ease::OutCubic,
    ];

    #[test]
    fn endpoints_are_stable() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
        }
    }

    #[test]
    fn monotonic_spot_check() {
        for ease in ALL {
            let a = ease.apply(0.25);
            let b = ease.apply(0.5);
            let c = ease.apply(0.75);
            assert!(a < b);
            assert!(b < c);
        }
    }

    #[test]
    fn pulse_peaks_in_the_middle() {
        let k = Keyframes::pulse(0.8, Ease::Linear);
        assert_eq!(k.sample(0.0), 0.0);
        assert!((k.sample(0.5) - 0.8).abs() < 1e-6);
        assert!((k.sample(0.25) - 0.4).abs() < 1e-6);
        assert_eq!(k.sample(1.0), 0.0);
    }

    #[test]
    fn timed_keyframes_hold_until_their_time() {
        let flash = Keyframes::timed(&[0.0, 0.0, 1.0], &[0.0, 0.7, 1.0], Ease::InQuad);
        assert_eq!(flash.sample(0.5), 0.0);
        assert_eq!(flash.sample(0.7), 0.0);
        assert!(flash.sample(0.85) > 0.0);
        assert_eq!(flash.sample(1.0), 1.0);
    }

    #[test]
    fn fades_run_between_zero_and_one() {
        let started = Duration::from_millis(100);
        let duration = Duration::from_millis(900);
        let fade_in = Fade::In { started, duration };
        let fade_out = Fade::Out {
            started,
            duration,
            from: 1.0,
        };
        assert_eq!(fade_in.opacity(started), 0.0);
        assert_eq!(fade_in.opacity(started + duration), 1.0);
        assert_eq!(fade_out.opacity(started), 1.0);
        assert_eq!(fade_out.opacity(started + duration), 0.0);
    }

    #[test]
    fn interrupted_fade_out_starts_where_it_was() {
        let started = Duration::from_millis(300);
        let duration = Duration::from_millis(900);
        let fade_out = Fade::Out {
            started,
            duration,
            from: 0.4,
        };
        assert!((fade_out.opacity(started) - 0.4).abs() < 1e-6);
        assert!(fade_out.opacity(started + duration / 2) < 0.4);
        assert_eq!(fade_out.opacity(started + duration), 0.0);
    }

    #[test]
    fn zero_duration_is_complete() {
        assert_eq!(progress(Duration::ZERO, Duration::ZERO), 1.0);
    }
}
