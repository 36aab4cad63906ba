//! Instanced ornaments: gift boxes, baubles and lights.
//!
//! Unlike the needles, every ornament carries its own position on the CPU and
//! chases its destination each frame:
//!
//! ```text
//! current = current.lerp(destination, delta * tier.speed())
//! ```
//!
//! Heavy ornaments settle slowly, light ones snap into place. All of them spin
//! slowly about a random axis, breathe while the tree is assembled, and the
//! light tier twinkles on top of that.

use crate::blend::sanitize_delta;
use crate::dispersal::{DispersalConfig, DispersalState, DispersalStats};
use crate::distribution::{centered, chaos_point, ornament_point, unit_or_up};
use crate::error::ConfigError;
use crate::layer::{FrameInput, PositionProvider};
use crate::render::{InstanceRaw, OrnamentBatch};
use glam::{Mat4, Quat, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Weight class of an ornament group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightTier {
    /// Gift boxes: large and slow.
    Heavy,
    /// Baubles.
    Medium,
    /// Glowing lights: small, fast, twinkling.
    Light,
}

impl WeightTier {
    /// Chase speed toward the destination, per second.
    pub fn speed(self) -> f32 {
        match self {
            WeightTier::Heavy => 1.0,
            WeightTier::Medium => 2.0,
            WeightTier::Light => 4.0,
        }
    }

    /// Base uniform scale of the mesh.
    pub fn scale(self) -> f32 {
        match self {
            WeightTier::Heavy => 0.15,
            WeightTier::Medium => 0.12,
            WeightTier::Light => 0.10,
        }
    }

    /// Launch speeds when knocked loose by the pointer.
    pub fn dispersal_speed(self) -> Range<f32> {
        match self {
            WeightTier::Heavy => 5.0..10.0,
            WeightTier::Medium => 6.0..14.0,
            WeightTier::Light => 8.0..20.0,
        }
    }

    /// Dispersal tuning for this tier.
    pub fn dispersal(self) -> DispersalConfig {
        DispersalConfig::dissolve().with_speed(self.dispersal_speed())
    }

    pub fn name(self) -> &'static str {
        match self {
            WeightTier::Heavy => "heavy",
            WeightTier::Medium => "medium",
            WeightTier::Light => "light",
        }
    }
}

/// Mesh an ornament group is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrnamentShape {
    /// Unit cube.
    Box,
    /// Unit sphere.
    Sphere,
}

/// Surface parameters of an ornament group.
#[derive(Debug, Clone, PartialEq)]
pub struct OrnamentMaterial {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub transparent: bool,
    pub opacity: f32,
}

impl OrnamentMaterial {
    /// Polished defaults for a tier: lights are mirror-like and glow strongly,
    /// gift boxes glow faintly, baubles not at all.
    pub fn for_tier(tier: WeightTier, color: [f32; 3]) -> Self {
        let (metalness, roughness) = match tier {
            WeightTier::Light => (0.95, 0.1),
            _ => (0.85, 0.2),
        };
        let (emissive, emissive_intensity) = match tier {
            WeightTier::Light => (color, 2.5),
            WeightTier::Heavy => (color, 0.3),
            WeightTier::Medium => ([0.0; 3], 0.0),
        };
        Self {
            color,
            metalness,
            roughness,
            emissive,
            emissive_intensity,
            transparent: false,
            opacity: 1.0,
        }
    }

    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Make the material see-through. Opacity of 1 keeps it opaque.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for c in self.color.iter().chain(self.emissive.iter()) {
            ConfigError::unit("color", *c)?;
        }
        ConfigError::unit("metalness", self.metalness)?;
        ConfigError::unit("roughness", self.roughness)?;
        ConfigError::unit("opacity", self.opacity)?;
        ConfigError::non_negative("emissive_intensity", self.emissive_intensity)
    }
}

/// Tuning for one ornament group.
#[derive(Debug, Clone, PartialEq)]
pub struct OrnamentConfig {
    pub tier: WeightTier,
    pub count: usize,
    pub shape: OrnamentShape,
    pub material: OrnamentMaterial,
    pub chaos_radius: f32,
    pub radius: f32,
    pub height: f32,
    /// Pointer dispersal, if this group reacts to it.
    pub dispersal: Option<DispersalConfig>,
}

impl OrnamentConfig {
    pub fn new(tier: WeightTier, count: usize, color: [f32; 3], shape: OrnamentShape) -> Self {
        Self {
            tier,
            count,
            shape,
            material: OrnamentMaterial::for_tier(tier, color),
            chaos_radius: 20.0,
            radius: 5.5,
            height: 13.0,
            dispersal: None,
        }
    }

    pub fn with_material(mut self, material: OrnamentMaterial) -> Self {
        self.material = material;
        self
    }

    /// React to the pointer with this tier's dispersal tuning.
    pub fn dispersing(mut self) -> Self {
        self.dispersal = Some(self.tier.dispersal());
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::non_negative("chaos_radius", self.chaos_radius)?;
        ConfigError::positive("radius", self.radius)?;
        ConfigError::positive("height", self.height)?;
        self.material.validate()?;
        match &self.dispersal {
            Some(d) => d.validate(),
            None => Ok(()),
        }
    }
}

/// Slow spin about a fixed random axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spin {
    axis: Vec3,
    /// Radians per 1/60 s.
    speed: f32,
    angle: f32,
}

/// One group of instanced ornaments sharing tier, mesh and material.
#[derive(Debug)]
pub struct OrnamentLayer {
    config: OrnamentConfig,
    assembled: bool,
    chaos: Vec<Vec3>,
    tree: Vec<Vec3>,
    current: Vec<Vec3>,
    spins: Vec<Spin>,
    instances: Vec<InstanceRaw>,
    dispersal: Option<DispersalState>,
    rng: SmallRng,
}

impl OrnamentLayer {
    /// Place `config.count` ornaments, all starting at their chaos points.
    pub fn new(config: OrnamentConfig, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        config.validate()?;
        let count = config.count;

        let mut chaos = Vec::with_capacity(count);
        let mut tree = Vec::with_capacity(count);
        let mut spins = Vec::with_capacity(count);
        for i in 0..count {
            chaos.push(chaos_point(rng, config.chaos_radius));
            tree.push(ornament_point(rng, i, count, config.radius, config.height));
            spins.push(Spin {
                speed: centered(rng) * 0.001,
                axis: unit_or_up(Vec3::new(centered(rng), centered(rng), centered(rng))),
                angle: 0.0,
            });
        }

        let base = config.tier.scale();
        let instances = chaos
            .iter()
            .map(|&p| InstanceRaw::from(Mat4::from_scale_rotation_translation(Vec3::splat(base), Quat::IDENTITY, p)))
            .collect();

        let dispersal = match &config.dispersal {
            Some(d) => Some(DispersalState::new(count, d.clone())?),
            None => None,
        };

        Ok(Self {
            current: chaos.clone(),
            rng: SmallRng::seed_from_u64(rng.gen()),
            config,
            assembled: false,
            chaos,
            tree,
            spins,
            instances,
            dispersal,
        })
    }

    pub fn config(&self) -> &OrnamentConfig {
        &self.config
    }

    pub fn tier(&self) -> WeightTier {
        self.config.tier
    }

    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    pub fn dispersal(&self) -> Option<&DispersalState> {
        self.dispersal.as_ref()
    }

    /// Transforms from the last step.
    pub fn instances(&self) -> &[InstanceRaw] {
        &self.instances
    }

    /// Render batch for the last stepped frame.
    pub fn batch(&self) -> OrnamentBatch<'_> {
        OrnamentBatch {
            shape: self.config.shape,
            material: &self.config.material,
            instances: &self.instances,
        }
    }

    /// Scale of ornament `index` at time `t`.
    ///
    /// Assembled ornaments breathe around their base scale; lights also
    /// twinkle at a higher frequency.
    pub fn scale_at(&self, index: usize, t: f32) -> f32 {
        let base = self.config.tier.scale();
        if !self.assembled {
            return base;
        }
        let id = index as f32;
        let breathing = (t * 2.0 + id).sin() * 0.15 * base;
        let twinkle = match self.config.tier {
            WeightTier::Light => (t * 4.0 + id * 0.1).sin() * 0.1 * base,
            _ => 0.0,
        };
        base + breathing + twinkle
    }

    /// Rotation of ornament `index` after the last step.
    pub fn rotation(&self, index: usize) -> Quat {
        let spin = &self.spins[index];
        Quat::from_axis_angle(spin.axis, spin.angle)
    }
}

impl PositionProvider for OrnamentLayer {
    fn len(&self) -> usize {
        self.current.len()
    }

    fn position(&self, index: usize) -> Vec3 {
        self.current[index]
    }

    fn tree_position(&self, index: usize) -> Vec3 {
        self.tree[index]
    }

    fn chaos_position(&self, index: usize) -> Vec3 {
        self.chaos[index]
    }

    fn step(&mut self, frame: &FrameInput) -> DispersalStats {
        let delta = sanitize_delta(frame.delta);
        self.assembled = frame.assembled;
        let chase = (delta * self.config.tier.speed()).min(1.0);

        let mut stats = DispersalStats::default();
        if let Some(dispersal) = self.dispersal.as_mut() {
            let pointer = frame.pointer.filter(|_| frame.assembled);
            stats = dispersal.step(&mut self.current, &self.tree, pointer, delta, &mut self.rng);
        }

        let mut faults = 0;
        for i in 0..self.current.len() {
            let flying = self.dispersal.as_ref().is_some_and(|d| d.is_active(i));
            let destination = if self.assembled { self.tree[i] } else { self.chaos[i] };
            if !flying {
                self.current[i] = self.current[i].lerp(destination, chase);
            }
            if !self.current[i].is_finite() {
                self.current[i] = destination;
                faults += 1;
            }

            let spin = &mut self.spins[i];
            spin.angle = (spin.angle + spin.speed * delta * 60.0) % std::f32::consts::TAU;

            let scale = self.scale_at(i, frame.elapsed);
            self.instances[i] = InstanceRaw::from(Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                self.rotation(i),
                self.current[i],
            ));
        }

        if faults > 0 {
            log::warn!(
                "{} ornaments: reset {} non-finite positions",
                self.config.tier.name(),
                faults
            );
        }
        stats.faults += faults;
        stats
    }
}
