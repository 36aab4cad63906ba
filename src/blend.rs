//! Assembly progress and blending between the two arrangements.
//!
//! A layer's [`AssemblyState`] holds a scalar `progress` in `[0, 1]` that is
//! eased toward the current target every frame:
//!
//! ```text
//! progress = lerp(progress, target, rate * delta)
//! ```
//!
//! The foliage layer feeds `progress` through [`cubic_in_out`] and mixes each
//! needle's chaos and tree coordinates with it. Ornaments do not read
//! `progress` at all; they chase their own target per instance.

use crate::error::ConfigError;

/// Gap below which progress snaps onto its target.
const SETTLE_EPSILON: f32 = 1e-4;

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic ease-in-out on `[0, 1]`.
///
/// `4t³` for the first half, `1 - (-2t + 2)³ / 2` for the second.
#[inline]
pub fn cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let f = -2.0 * t + 2.0;
        1.0 - f * f * f / 2.0
    }
}

/// Clamp a frame delta into something safe to integrate with.
///
/// Negative or non-finite deltas become zero.
#[inline]
pub fn sanitize_delta(delta: f32) -> f32 {
    if delta.is_finite() && delta > 0.0 {
        delta
    } else {
        0.0
    }
}

/// Assembled-ness of one visual layer.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyState {
    progress: f32,
    assembled: bool,
    rate: f32,
}

impl AssemblyState {
    /// Start fully scattered with the given easing rate.
    pub fn new(rate: f32) -> Result<Self, ConfigError> {
        ConfigError::positive("rate", rate)?;
        Ok(Self {
            progress: 0.0,
            assembled: false,
            rate,
        })
    }

    /// Current progress, `0.0` scattered to `1.0` assembled.
    #[inline]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Progress after cubic easing, as the needles use it.
    #[inline]
    pub fn eased(&self) -> f32 {
        cubic_in_out(self.progress)
    }

    /// Whether the layer is heading toward the assembled tree.
    #[inline]
    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    /// Easing rate per second.
    #[inline]
    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Numeric target, `1.0` when assembled.
    #[inline]
    pub fn target(&self) -> f32 {
        if self.assembled {
            1.0
        } else {
            0.0
        }
    }

    /// Point the layer at the tree or at the scattered cloud.
    ///
    /// Returns `true` if the target actually changed. Repeating the current
    /// target is a no-op.
    pub fn set_assembled(&mut self, assembled: bool) -> bool {
        if self.assembled == assembled {
            return false;
        }
        self.assembled = assembled;
        true
    }

    /// Jump straight to `progress` (clamped to `[0, 1]`).
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            self.target()
        };
    }

    /// Advance one frame. Returns the new progress.
    pub fn advance(&mut self, delta: f32) -> f32 {
        let step = (self.rate * sanitize_delta(delta)).min(1.0);
        let target = self.target();
        self.progress = lerp(self.progress, target, step).clamp(0.0, 1.0);
        if step > 0.0 && (self.progress - target).abs() < SETTLE_EPSILON {
            self.progress = target;
        }
        self.progress
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_in_out_endpoints() {
        assert_eq!(cubic_in_out(0.0), 0.0);
        assert_eq!(cubic_in_out(1.0), 1.0);
        assert!((cubic_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((cubic_in_out(0.25) - 0.0625).abs() < 1e-6);
    }

    #[test]
    fn test_cubic_in_out_monotonic() {
        let mut last = 0.0;
        for i in 0..=100 {
            let v = cubic_in_out(i as f32 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_no_drift_at_rest() {
        let mut state = AssemblyState::new(1.5).unwrap();
        state.set_progress(0.37);
        for _ in 0..1000 {
            state.advance(0.0);
        }
        assert_eq!(state.progress(), 0.37);
    }

    #[test]
    fn test_converges_from_any_start() {
        for start in [0.0, 0.2, 0.5, 0.99, 1.0] {
            let mut state = AssemblyState::new(1.5).unwrap();
            state.set_assembled(true);
            state.set_progress(start);
            let mut frames = 0;
            while state.progress() < 1.0 - 1e-3 {
                state.advance(1.0 / 60.0);
                frames += 1;
                assert!(frames < 2000, "did not converge from {}", start);
            }
        }
    }

    #[test]
    fn test_settles_exactly() {
        let mut state = AssemblyState::new(4.0).unwrap();
        state.set_assembled(true);
        for _ in 0..2000 {
            state.advance(1.0 / 60.0);
        }
        assert_eq!(state.progress(), 1.0);
        assert_eq!(state.eased(), 1.0);
    }

    #[test]
    fn test_set_assembled_idempotent() {
        let mut state = AssemblyState::new(1.5).unwrap();
        assert!(state.set_assembled(true));
        assert!(!state.set_assembled(true));
        assert!(state.set_assembled(false));
    }

    #[test]
    fn test_large_delta_does_not_overshoot() {
        let mut state = AssemblyState::new(1.5).unwrap();
        state.set_assembled(true);
        state.advance(10.0);
        assert_eq!(state.progress(), 1.0);
    }

    #[test]
    fn test_bad_delta_is_ignored() {
        let mut state = AssemblyState::new(1.5).unwrap();
        state.set_assembled(true);
        state.advance(f32::NAN);
        state.advance(-1.0);
        assert_eq!(state.progress(), 0.0);
    }

    #[test]
    fn test_rejects_bad_rate() {
        assert!(AssemblyState::new(0.0).is_err());
        assert!(AssemblyState::new(f32::INFINITY).is_err());
    }
}
