//! Scene composition: presets and the [`TreeScene`] root.
//!
//! A [`VisualPreset`] is plain data (entity counts, ornament groups, how the
//! tree is toggled). [`TreeScene::new`] builds every layer from it, and
//! [`TreeScene::step`] advances them together, returning the frame's
//! [`RenderSnapshot`].
//!
//! ```ignore
//! let preset = VisualPreset::by_name("grand")?;
//! let mut scene = TreeScene::new(&preset)?;
//! scene.toggle();
//! let snapshot = scene.step(elapsed, delta);
//! adapter.draw(&snapshot);
//! ```

use crate::accents::{Bow, StarLights, TreeStar};
use crate::blend::sanitize_delta;
use crate::dispersal::DispersalStats;
use crate::distribution::seeded_rng;
use crate::error::{ConfigError, PresetError};
use crate::foliage::{Foliage, FoliageConfig};
use crate::input::{Input, ToggleGesture, ToggleTrigger};
use crate::interaction::{OrbitCamera, TreeEnvelope};
use crate::layer::{FrameInput, PositionProvider};
use crate::ornaments::{OrnamentConfig, OrnamentLayer, OrnamentShape, WeightTier};
use crate::render::{rgb_hex, FrameStats, InstanceRaw, RenderSnapshot, StarFrame};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One group of identical ornaments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrnamentGroup {
    pub tier: WeightTier,
    pub count: usize,
    pub color: [f32; 3],
    pub shape: OrnamentShape,
    /// Whether the group scatters away from the pointer.
    #[serde(default)]
    pub disperse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metalness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roughness: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

impl OrnamentGroup {
    pub fn new(tier: WeightTier, count: usize, color: u32, shape: OrnamentShape) -> Self {
        Self {
            tier,
            count,
            color: rgb_hex(color),
            shape,
            disperse: false,
            metalness: None,
            roughness: None,
            opacity: None,
        }
    }

    pub fn dispersing(mut self) -> Self {
        self.disperse = true;
        self
    }

    /// Layer configuration, with the tier's material defaults under any
    /// overrides.
    pub fn config(&self) -> OrnamentConfig {
        let mut config = OrnamentConfig::new(self.tier, self.count, self.color, self.shape);
        if let Some(metalness) = self.metalness {
            config.material = config.material.with_metalness(metalness);
        }
        if let Some(roughness) = self.roughness {
            config.material = config.material.with_roughness(roughness);
        }
        if let Some(opacity) = self.opacity {
            config.material = config.material.with_opacity(opacity);
        }
        if self.disperse {
            config = config.dispersing();
        }
        config
    }
}

/// Everything that distinguishes one rendition of the tree from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualPreset {
    pub name: String,
    pub foliage_count: usize,
    pub ornaments: Vec<OrnamentGroup>,
    pub star_lights: usize,
    /// Bow anchors in tree-local space.
    pub bows: Vec<[f32; 3]>,
    pub toggle: ToggleTrigger,
    /// Largest press-to-release travel in pixels that still toggles.
    pub tap_slop: f32,
    /// World position of the tree's origin.
    pub tree_offset: [f32; 3],
    /// Idle camera rotation in radians per second.
    pub auto_rotate: f32,
    /// Fixed seed for a reproducible scene.
    pub seed: Option<u64>,
    /// Initial assembly target.
    pub start_assembled: bool,
}

impl Default for VisualPreset {
    fn default() -> Self {
        Self::grand()
    }
}

impl VisualPreset {
    /// The full tree with a toggle button: 30 000 needles and 1 220 ornaments.
    pub fn grand() -> Self {
        use OrnamentShape::{Box, Sphere};
        use WeightTier::{Heavy, Light, Medium};
        Self {
            name: "grand".into(),
            foliage_count: 30_000,
            ornaments: vec![
                OrnamentGroup::new(Heavy, 80, 0xFFD700, Box),
                OrnamentGroup::new(Heavy, 60, 0x004225, Box),
                OrnamentGroup::new(Medium, 200, 0xDC143C, Sphere),
                OrnamentGroup::new(Medium, 180, 0xFFD700, Sphere),
                OrnamentGroup::new(Medium, 150, 0x004225, Sphere),
                OrnamentGroup::new(Light, 300, 0xFFD700, Sphere),
                OrnamentGroup::new(Light, 250, 0xFFFFFF, Sphere),
            ],
            star_lights: 60,
            bows: Vec::new(),
            toggle: ToggleTrigger::button(),
            tap_slop: 6.0,
            tree_offset: [0.0, -2.0, 0.0],
            // half the default orbit-control speed: a full turn every two minutes
            auto_rotate: std::f32::consts::TAU / 120.0,
            seed: None,
            start_assembled: false,
        }
    }

    /// Tap anywhere to toggle. Denser ornaments, the lighter ones scatter
    /// under the pointer, and two bows hang on the front.
    pub fn tap() -> Self {
        use OrnamentShape::{Box, Sphere};
        use WeightTier::{Heavy, Light, Medium};
        Self {
            name: "tap".into(),
            ornaments: vec![
                OrnamentGroup::new(Heavy, 120, 0xFFD700, Box),
                OrnamentGroup::new(Heavy, 100, 0x004225, Box),
                OrnamentGroup::new(Medium, 360, 0xDC143C, Sphere).dispersing(),
                OrnamentGroup::new(Medium, 320, 0xFFD700, Sphere).dispersing(),
                OrnamentGroup::new(Medium, 240, 0x004225, Sphere).dispersing(),
                OrnamentGroup::new(Light, 700, 0xFFD700, Sphere).dispersing(),
                OrnamentGroup::new(Light, 560, 0xFFFFFF, Sphere).dispersing(),
            ],
            bows: vec![[0.0, 2.0, 2.2], [1.8, -2.0, 3.1]],
            toggle: ToggleTrigger::ScreenTap,
            ..Self::grand()
        }
    }

    /// Look up a built-in preset.
    pub fn by_name(name: &str) -> Result<Self, PresetError> {
        match name {
            "grand" => Ok(Self::grand()),
            "tap" => Ok(Self::tap()),
            other => Err(PresetError::UnknownPreset(other.to_string())),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, PresetError> {
        let preset: Self = serde_json::from_str(json)?;
        preset.validate()?;
        Ok(preset)
    }

    pub fn to_json_string(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Total ornament instances across groups.
    pub fn ornament_count(&self) -> usize {
        self.ornaments.iter().map(|g| g.count).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::non_negative("tap_slop", self.tap_slop)?;
        ConfigError::finite("auto_rotate", self.auto_rotate)?;
        for &c in &self.tree_offset {
            ConfigError::finite("tree_offset", c)?;
        }
        for &c in self.bows.iter().flatten() {
            ConfigError::finite("bows", c)?;
        }
        if let ToggleTrigger::Button { width, height, bottom_margin } = self.toggle {
            ConfigError::positive("button.width", width)?;
            ConfigError::positive("button.height", height)?;
            ConfigError::non_negative("button.bottom_margin", bottom_margin)?;
        }
        for group in &self.ornaments {
            group.config().validate()?;
        }
        Ok(())
    }
}

/// The whole tree: needles, ornaments, accents, and how the pointer reaches
/// them.
#[derive(Debug)]
pub struct TreeScene {
    name: String,
    foliage: Foliage,
    ornaments: Vec<OrnamentLayer>,
    star: TreeStar,
    star_frame: StarFrame,
    star_lights: StarLights,
    bows: Vec<Bow>,
    bow_instances: Vec<InstanceRaw>,
    camera: OrbitCamera,
    envelope: TreeEnvelope,
    gesture: ToggleGesture,
    tree_offset: Vec3,
    assembled: bool,
    pointer: Option<Vec3>,
    viewport: Vec2,
    elapsed: f32,
    stats: FrameStats,
}

impl TreeScene {
    pub fn new(preset: &VisualPreset) -> Result<Self, PresetError> {
        preset.validate()?;
        let mut rng = seeded_rng(preset.seed);

        let foliage_config = FoliageConfig::default().with_count(preset.foliage_count);
        let envelope = TreeEnvelope {
            radius: foliage_config.radius,
            height: foliage_config.height,
            ..TreeEnvelope::default()
        };
        let apex = Vec3::new(0.0, foliage_config.height * 0.5, 0.0);
        let foliage = Foliage::new(foliage_config, &mut rng)?;

        let ornaments = preset
            .ornaments
            .iter()
            .map(|group| OrnamentLayer::new(group.config(), &mut rng))
            .collect::<Result<Vec<_>, _>>()?;

        let star = TreeStar::new(apex);
        let star_frame = star.frame();
        let bows: Vec<Bow> = preset.bows.iter().map(|&p| Bow::new(Vec3::from_array(p))).collect();

        log::info!(
            "Built '{}' tree: {} needles, {} ornaments in {} groups, {} star lights",
            preset.name,
            foliage.len(),
            preset.ornament_count(),
            ornaments.len(),
            preset.star_lights
        );

        Ok(Self {
            name: preset.name.clone(),
            foliage,
            ornaments,
            star,
            star_frame,
            star_lights: StarLights::new(preset.star_lights, &mut rng),
            bow_instances: vec![InstanceRaw::from(Mat4::ZERO); bows.len()],
            bows,
            camera: OrbitCamera::new().with_auto_rotate(preset.auto_rotate),
            envelope,
            gesture: ToggleGesture::new(preset.toggle, preset.tap_slop),
            tree_offset: Vec3::from_array(preset.tree_offset),
            assembled: preset.start_assembled,
            pointer: None,
            viewport: Vec2::new(1280.0, 720.0),
            elapsed: 0.0,
            stats: FrameStats::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn foliage(&self) -> &Foliage {
        &self.foliage
    }

    pub fn ornaments(&self) -> &[OrnamentLayer] {
        &self.ornaments
    }

    pub fn star(&self) -> &TreeStar {
        &self.star
    }

    pub fn star_lights(&self) -> &StarLights {
        &self.star_lights
    }

    pub fn bows(&self) -> &[Bow] {
        &self.bows
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn envelope(&self) -> &TreeEnvelope {
        &self.envelope
    }

    pub fn gesture(&self) -> &ToggleGesture {
        &self.gesture
    }

    pub fn tree_offset(&self) -> Vec3 {
        self.tree_offset
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Counters from the last step.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// The assembly target, not the progress toward it.
    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    /// Set the assembly target. Returns whether it changed.
    pub fn set_assembled(&mut self, assembled: bool) -> bool {
        if self.assembled == assembled {
            return false;
        }
        self.assembled = assembled;
        log::debug!(
            "'{}' tree target: {}",
            self.name,
            if assembled { "assembled" } else { "scattered" }
        );
        true
    }

    pub fn toggle(&mut self) {
        self.set_assembled(!self.assembled);
    }

    /// Current interaction point in tree-local space.
    pub fn pointer(&self) -> Option<Vec3> {
        self.pointer
    }

    /// Set the interaction point directly, in tree-local space.
    pub fn set_interaction_point(&mut self, point: Option<Vec3>) {
        self.pointer = point.filter(|p| p.is_finite());
    }

    /// Tree-local interaction point under a cursor, if any.
    ///
    /// A cursor over the toggle button never reaches the tree.
    pub fn pointer_at(&self, cursor: Vec2, viewport: Vec2) -> Option<Vec3> {
        if self.gesture.trigger.blocks_pointer(cursor, viewport) {
            return None;
        }
        let ray = self.camera.screen_ray(cursor, viewport)?;
        self.envelope.project(&ray.relative_to(self.tree_offset))
    }

    /// Apply this frame's pointer state. Returns whether the target flipped.
    ///
    /// Call before [`step`](Self::step), then clear the input's per-frame
    /// state.
    pub fn handle_input(&mut self, input: &Input) -> bool {
        self.viewport = input.window_size();
        let toggles = self.gesture.count(input.clicks(), self.viewport);
        if toggles % 2 == 1 {
            self.toggle();
        }
        self.pointer = input.cursor().and_then(|c| self.pointer_at(c, self.viewport));
        toggles % 2 == 1
    }

    /// Advance every layer to `elapsed`, `delta` seconds after the last step.
    pub fn step(&mut self, elapsed: f32, delta: f32) -> RenderSnapshot<'_> {
        let delta = sanitize_delta(delta);
        self.elapsed = elapsed;
        self.camera.advance(delta);

        let frame = FrameInput::new(elapsed, delta)
            .with_pointer(self.pointer)
            .assembled(self.assembled);

        let needles = self.foliage.step(&frame);
        let mut ornaments = DispersalStats::default();
        for layer in &mut self.ornaments {
            let stats = layer.step(&frame);
            ornaments.activated += stats.activated;
            ornaments.landed += stats.landed;
            ornaments.in_flight += stats.in_flight;
            ornaments.faults += stats.faults;
        }

        self.star_frame = self.star.step(elapsed, self.assembled);
        self.star_lights.step(elapsed);
        for (bow, raw) in self.bows.iter_mut().zip(self.bow_instances.iter_mut()) {
            *raw = bow.step(elapsed, self.assembled);
        }

        self.stats = FrameStats {
            frame: self.stats.frame + 1,
            needles_in_flight: needles.in_flight,
            ornaments_in_flight: ornaments.in_flight,
            activated: needles.activated + ornaments.activated,
            faults: needles.faults + ornaments.faults,
        };
        log::trace!(
            "frame {}: progress {:.3}, {} needles and {} ornaments in flight",
            self.stats.frame,
            self.foliage.assembly().progress(),
            self.stats.needles_in_flight,
            self.stats.ornaments_in_flight
        );

        self.snapshot()
    }

    /// Render data for the last step.
    pub fn snapshot(&self) -> RenderSnapshot<'_> {
        let tree_transform = Mat4::from_translation(self.tree_offset);
        let aspect = if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        };
        let view_proj = self.camera.view_proj(aspect) * tree_transform;
        RenderSnapshot {
            elapsed: self.elapsed,
            tree_transform,
            foliage: self.foliage.frame(view_proj),
            ornaments: self.ornaments.iter().map(|l| l.batch()).collect(),
            star: self.star_frame,
            star_lights: self.star_lights.lights(),
            bows: &self.bow_instances,
            stats: self.stats,
        }
    }
}
