//! Local dispersal around an interaction point.
//!
//! When the pointer hovers over the assembled tree, entities within
//! `threshold` of the interaction point are flung outward, slow down, and
//! silently reappear at their rest slot once their lifetime has run out.
//!
//! Activation is edge-triggered: an entity that is already in flight ignores
//! the pointer until it has landed, so its velocity and lifetime are never
//! reset mid-flight.
//!
//! # Per-frame update
//!
//! For every active entity:
//!
//! ```text
//! position += velocity * delta
//! velocity *= damping            (once per frame, see Damping)
//! lifetime -= delta * decay_rate
//! lifetime <= 0  =>  inactive, velocity = 0, position = rest
//! ```

use crate::blend::sanitize_delta;
use crate::distribution::{centered, unit_or_up};
use crate::error::ConfigError;
use glam::Vec3;
use rand::Rng;
use std::ops::Range;

/// How velocity decays between frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damping {
    /// Multiply by the factor once per frame regardless of `delta`.
    ///
    /// Dispersal distance therefore depends on the display refresh rate.
    PerFrame(f32),
    /// Multiply by `factor.powf(delta * reference_fps)`.
    ///
    /// Matches `PerFrame(factor)` exactly at `reference_fps` and stays
    /// consistent at any other rate.
    Normalized {
        factor: f32,
        reference_fps: f32,
    },
}

impl Damping {
    /// Multiplier to apply to velocity for a frame of length `delta`.
    ///
    /// A frame with no elapsed time leaves velocity untouched.
    #[inline]
    pub fn multiplier(&self, delta: f32) -> f32 {
        if delta <= 0.0 {
            return 1.0;
        }
        match *self {
            Damping::PerFrame(factor) => factor,
            Damping::Normalized {
                factor,
                reference_fps,
            } => factor.powf(delta * reference_fps),
        }
    }

    fn factor(&self) -> f32 {
        match *self {
            Damping::PerFrame(factor) => factor,
            Damping::Normalized { factor, .. } => factor,
        }
    }
}

impl Default for Damping {
    fn default() -> Self {
        Damping::PerFrame(0.92)
    }
}

/// Tuning for one layer's dispersal.
#[derive(Debug, Clone, PartialEq)]
pub struct DispersalConfig {
    /// Entities closer than this to the interaction point are activated.
    pub threshold: f32,
    /// Lifetime given to a freshly activated entity.
    pub lifetime: f32,
    /// Lifetime consumed per second of flight.
    pub decay_rate: f32,
    /// Launch speed range.
    pub speed: Range<f32>,
    /// Full width of the per-axis random perturbation added to the outward
    /// direction before re-normalizing.
    pub jitter: f32,
    /// Velocity decay.
    pub damping: Damping,
}

impl Default for DispersalConfig {
    /// Needle tuning: wide radius, long flight.
    fn default() -> Self {
        Self {
            threshold: 2.5,
            lifetime: 1.5,
            decay_rate: 0.4,
            speed: 8.0..20.0,
            jitter: 0.6,
            damping: Damping::PerFrame(0.92),
        }
    }
}

impl DispersalConfig {
    /// Softer dissolve tuning: smaller radius, shorter and slower flight.
    pub fn dissolve() -> Self {
        Self {
            threshold: 2.0,
            lifetime: 1.0,
            decay_rate: 0.5,
            speed: 5.0..15.0,
            jitter: 0.5,
            damping: Damping::PerFrame(0.95),
        }
    }

    /// Set the activation radius.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the launch speed range.
    pub fn with_speed(mut self, speed: Range<f32>) -> Self {
        self.speed = speed;
        self
    }

    /// Set the lifetime budget and how fast it drains.
    pub fn with_lifetime(mut self, lifetime: f32, decay_rate: f32) -> Self {
        self.lifetime = lifetime;
        self.decay_rate = decay_rate;
        self
    }

    /// Set the velocity damping mode.
    pub fn with_damping(mut self, damping: Damping) -> Self {
        self.damping = damping;
        self
    }

    /// Check every field for sane values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::non_negative("threshold", self.threshold)?;
        ConfigError::positive("lifetime", self.lifetime)?;
        ConfigError::positive("decay_rate", self.decay_rate)?;
        ConfigError::range("speed", self.speed.start, self.speed.end)?;
        ConfigError::non_negative("jitter", self.jitter)?;
        let factor = self.damping.factor();
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ConfigError::Damping(factor));
        }
        if let Damping::Normalized { reference_fps, .. } = self.damping {
            ConfigError::positive("reference_fps", reference_fps)?;
        }
        Ok(())
    }

    /// Seconds an activated entity stays in flight.
    pub fn flight_time(&self) -> f32 {
        self.lifetime / self.decay_rate
    }
}

/// What happened during one dispersal step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispersalStats {
    /// Entities activated this frame.
    pub activated: usize,
    /// Entities that landed back on their rest slot this frame.
    pub landed: usize,
    /// Entities in flight after the step.
    pub in_flight: usize,
    /// Entities reset because their state went non-finite.
    pub faults: usize,
}

impl DispersalStats {
    /// Whether any position was written this frame.
    pub fn moved(&self) -> bool {
        self.in_flight > 0 || self.landed > 0 || self.faults > 0
    }
}

/// Per-entity flight state, stored as parallel arrays.
///
/// Positions and rest slots are owned by the layer and passed into
/// [`DispersalState::step`], so the same state drives needles and ornaments.
#[derive(Debug, Clone)]
pub struct DispersalState {
    config: DispersalConfig,
    velocities: Vec<Vec3>,
    active: Vec<bool>,
    lifetimes: Vec<f32>,
}

impl DispersalState {
    /// Flight state for `count` entities, all at rest.
    pub fn new(count: usize, config: DispersalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            velocities: vec![Vec3::ZERO; count],
            active: vec![false; count],
            lifetimes: vec![0.0; count],
        })
    }

    pub fn config(&self) -> &DispersalConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    #[inline]
    pub fn is_active(&self, index: usize) -> bool {
        self.active[index]
    }

    #[inline]
    pub fn velocity(&self, index: usize) -> Vec3 {
        self.velocities[index]
    }

    #[inline]
    pub fn lifetime(&self, index: usize) -> f32 {
        self.lifetimes[index]
    }

    /// Number of entities currently in flight.
    pub fn in_flight(&self) -> usize {
        self.active.iter().filter(|&&a| a).count()
    }

    /// Launch entity `index` away from `point`, unless it is already flying.
    ///
    /// Returns `true` if the entity was activated.
    pub fn activate(&mut self, index: usize, position: Vec3, point: Vec3, rng: &mut impl Rng) -> bool {
        if self.active[index] {
            return false;
        }
        let jitter = self.config.jitter;
        let outward = unit_or_up(position - point);
        let direction = unit_or_up(
            outward
                + Vec3::new(
                    centered(rng) * jitter,
                    centered(rng) * jitter,
                    centered(rng) * jitter,
                ),
        );
        let speed = rng.gen_range(self.config.speed.clone());

        self.active[index] = true;
        self.lifetimes[index] = self.config.lifetime;
        self.velocities[index] = direction * speed;
        true
    }

    fn land(&mut self, index: usize, positions: &mut [Vec3], rest: &[Vec3]) {
        self.active[index] = false;
        self.lifetimes[index] = 0.0;
        self.velocities[index] = Vec3::ZERO;
        positions[index] = rest[index];
    }

    /// Advance one frame.
    ///
    /// `pointer` is the interaction point, or `None` when nothing should be
    /// triggered this frame. Entities already in flight keep moving either way.
    /// A zero-length frame (paused clock, rejected delta) freezes them in place
    /// with their velocity and lifetime intact.
    /// `positions` and `rest` must both have [`len`](Self::len) entries.
    pub fn step(
        &mut self,
        positions: &mut [Vec3],
        rest: &[Vec3],
        pointer: Option<Vec3>,
        delta: f32,
        rng: &mut impl Rng,
    ) -> DispersalStats {
        debug_assert_eq!(positions.len(), self.len());
        debug_assert_eq!(rest.len(), self.len());

        let delta = sanitize_delta(delta);
        let damping = self.config.damping.multiplier(delta);
        let drain = delta * self.config.decay_rate;
        let threshold_sq = self.config.threshold * self.config.threshold;
        let pointer = pointer.filter(|p| p.is_finite());
        let mut stats = DispersalStats::default();

        for i in 0..self.active.len() {
            if let Some(point) = pointer {
                if !self.active[i]
                    && positions[i].distance_squared(point) < threshold_sq
                    && self.activate(i, positions[i], point, rng)
                {
                    stats.activated += 1;
                }
            }

            if !self.active[i] {
                continue;
            }

            if delta > 0.0 {
                positions[i] += self.velocities[i] * delta;
                self.velocities[i] *= damping;
                self.lifetimes[i] -= drain;
            }

            if !positions[i].is_finite() || !self.velocities[i].is_finite() {
                self.land(i, positions, rest);
                stats.faults += 1;
            } else if self.lifetimes[i] <= 0.0 {
                self.land(i, positions, rest);
                stats.landed += 1;
            } else {
                stats.in_flight += 1;
            }
        }

        if stats.faults > 0 {
            log::warn!("reset {} entities with non-finite flight state", stats.faults);
        }
        stats
    }
}
