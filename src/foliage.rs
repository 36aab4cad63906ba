//! The needle cloud.
//!
//! Tens of thousands of point sprites, each with a chaos point and a tree
//! slot fixed at creation. Blending between the two happens per vertex in
//! [`FOLIAGE_SHADER`]; the CPU only eases the layer's progress and, while the
//! tree is assembled, knocks needles near the pointer out of their slots.
//!
//! The shader mixes from the chaos point toward the needle's live *slot*
//! rather than its fixed tree position. At rest the two are identical; while
//! a needle is dispersing its slot flies away and the blend follows it.

use crate::blend::{cubic_in_out, AssemblyState};
use crate::dispersal::{DispersalConfig, DispersalState, DispersalStats};
use crate::distribution::{chaos_point, cone_point};
use crate::error::ConfigError;
use crate::layer::{FrameInput, PositionProvider};
use crate::render::{rgb_hex, FoliageFrame, FoliageUniforms, FoliageVertex};
use glam::{Mat4, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// WGSL for drawing needles as camera-facing quads, six vertices per needle.
///
/// Vertex inputs: `@location(0)` chaos point and `@location(1)` seed from the
/// static [`FoliageVertex`] buffer, `@location(2)` the live slot buffer.
pub const FOLIAGE_SHADER: &str = r#"
struct FoliageUniforms {
    view_proj: mat4x4<f32>,
    time: f32,
    progress: f32,
    point_scale: f32,
    pad0: f32,
    color_high: vec4<f32>,
    color_low: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: FoliageUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) shade: f32,
};

fn cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        return 4.0 * t * t * t;
    }
    let f = -2.0 * t + 2.0;
    return 1.0 - f * f * f / 2.0;
}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) chaos: vec3<f32>,
    @location(1) seed: f32,
    @location(2) slot: vec3<f32>,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index % 6u];

    let t = cubic_in_out(clamp(uniforms.progress, 0.0, 1.0));
    var pos = mix(chaos, slot, t);

    // wind sway
    pos.y += sin(uniforms.time * 1.2 + seed * 10.0) * 0.02;
    pos.x += sin(uniforms.time * 1.0 + seed * 8.0) * 0.015;
    pos.z += cos(uniforms.time * 1.1 + seed * 9.0) * 0.015;

    var clip_pos = uniforms.view_proj * vec4<f32>(pos, 1.0);
    let half_size = uniforms.point_scale * (0.8 + t * 0.4) * 0.01;
    clip_pos.x += quad_pos.x * half_size;
    clip_pos.y += quad_pos.y * half_size;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.uv = quad_pos;
    out.shade = seed;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let r = length(in.uv) * 0.5;
    if r > 0.5 {
        discard;
    }
    let glow = pow(1.0 - r * 2.0, 1.5);
    let color = mix(uniforms.color_low.rgb, uniforms.color_high.rgb, in.shade * glow);
    return vec4<f32>(color, 1.0);
}
"#;

/// Wind sway offset for a needle with the given seed at time `t`.
///
/// Mirrors the sway in [`FOLIAGE_SHADER`].
#[inline]
pub fn sway(seed: f32, t: f32) -> Vec3 {
    Vec3::new(
        (t * 1.0 + seed * 8.0).sin() * 0.015,
        (t * 1.2 + seed * 10.0).sin() * 0.02,
        (t * 1.1 + seed * 9.0).cos() * 0.015,
    )
}

/// Needle layer tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct FoliageConfig {
    pub count: usize,
    /// Radius of the chaos shell.
    pub chaos_radius: f32,
    /// Base radius of the tree cone.
    pub radius: f32,
    pub height: f32,
    /// Easing rate of the assembly progress, per second.
    pub blend_rate: f32,
    pub point_scale: f32,
    pub color_high: [f32; 3],
    pub color_low: [f32; 3],
    pub dispersal: DispersalConfig,
}

impl Default for FoliageConfig {
    fn default() -> Self {
        Self {
            count: 30_000,
            chaos_radius: 30.0,
            radius: 6.0,
            height: 14.0,
            blend_rate: 1.5,
            point_scale: 3.5,
            color_high: rgb_hex(0x8A2BE2),
            color_low: rgb_hex(0x004225),
            dispersal: DispersalConfig::default(),
        }
    }
}

impl FoliageConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_dispersal(mut self, dispersal: DispersalConfig) -> Self {
        self.dispersal = dispersal;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::non_negative("chaos_radius", self.chaos_radius)?;
        ConfigError::positive("radius", self.radius)?;
        ConfigError::positive("height", self.height)?;
        ConfigError::positive("blend_rate", self.blend_rate)?;
        ConfigError::positive("point_scale", self.point_scale)?;
        for c in self.color_high.iter().chain(self.color_low.iter()) {
            ConfigError::unit("color", *c)?;
        }
        self.dispersal.validate()
    }
}

/// The needle layer.
#[derive(Debug)]
pub struct Foliage {
    config: FoliageConfig,
    assembly: AssemblyState,
    vertices: Vec<FoliageVertex>,
    tree: Vec<Vec3>,
    slots: Vec<Vec3>,
    dispersal: DispersalState,
    rng: SmallRng,
    elapsed: f32,
    slots_dirty: bool,
}

impl Foliage {
    /// Scatter and place `config.count` needles.
    pub fn new(config: FoliageConfig, rng: &mut impl Rng) -> Result<Self, ConfigError> {
        config.validate()?;
        let count = config.count;

        let mut vertices = Vec::with_capacity(count);
        let mut tree = Vec::with_capacity(count);
        for i in 0..count {
            let chaos = chaos_point(rng, config.chaos_radius);
            tree.push(cone_point(rng, i, count, config.radius, config.height));
            vertices.push(FoliageVertex {
                chaos: chaos.to_array(),
                seed: rng.gen(),
            });
        }

        Ok(Self {
            assembly: AssemblyState::new(config.blend_rate)?,
            dispersal: DispersalState::new(count, config.dispersal.clone())?,
            slots: tree.clone(),
            rng: SmallRng::seed_from_u64(rng.gen()),
            config,
            vertices,
            tree,
            elapsed: 0.0,
            slots_dirty: false,
        })
    }

    pub fn config(&self) -> &FoliageConfig {
        &self.config
    }

    pub fn assembly(&self) -> &AssemblyState {
        &self.assembly
    }

    /// Mutable access, e.g. to jump straight to the assembled tree.
    pub fn assembly_mut(&mut self) -> &mut AssemblyState {
        &mut self.assembly
    }

    pub fn dispersal(&self) -> &DispersalState {
        &self.dispersal
    }

    pub fn vertices(&self) -> &[FoliageVertex] {
        &self.vertices
    }

    /// Live slots, as uploaded to the shader.
    pub fn slots(&self) -> &[Vec3] {
        &self.slots
    }

    /// Blended position of needle `index` at time `t`, as the shader draws it.
    pub fn display_position(&self, index: usize, t: f32) -> Vec3 {
        let chaos = Vec3::from_array(self.vertices[index].chaos);
        let eased = cubic_in_out(self.assembly.progress());
        chaos.lerp(self.slots[index], eased) + sway(self.vertices[index].seed, t)
    }

    /// Uniform block for the current frame.
    pub fn uniforms(&self, view_proj: Mat4) -> FoliageUniforms {
        let [hr, hg, hb] = self.config.color_high;
        let [lr, lg, lb] = self.config.color_low;
        FoliageUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            time: self.elapsed,
            progress: self.assembly.progress(),
            point_scale: self.config.point_scale,
            _pad: 0.0,
            color_high: [hr, hg, hb, 1.0],
            color_low: [lr, lg, lb, 1.0],
        }
    }

    /// Render data for the last stepped frame.
    pub fn frame(&self, view_proj: Mat4) -> FoliageFrame<'_> {
        FoliageFrame {
            uniforms: self.uniforms(view_proj),
            vertices: &self.vertices,
            slots: &self.slots,
            slots_dirty: self.slots_dirty,
        }
    }
}

impl PositionProvider for Foliage {
    fn len(&self) -> usize {
        self.vertices.len()
    }

    fn position(&self, index: usize) -> Vec3 {
        self.display_position(index, self.elapsed)
    }

    fn tree_position(&self, index: usize) -> Vec3 {
        self.tree[index]
    }

    fn chaos_position(&self, index: usize) -> Vec3 {
        Vec3::from_array(self.vertices[index].chaos)
    }

    fn step(&mut self, frame: &FrameInput) -> DispersalStats {
        if self.assembly.set_assembled(frame.assembled) {
            log::debug!(
                "foliage heading to {}",
                if frame.assembled { "tree" } else { "chaos" }
            );
        }
        self.elapsed = frame.elapsed;
        self.assembly.advance(frame.delta);

        // Only the formed tree reacts to the pointer.
        let pointer = frame.pointer.filter(|_| self.assembly.is_assembled());
        let stats = self
            .dispersal
            .step(&mut self.slots, &self.tree, pointer, frame.delta, &mut self.rng);
        self.slots_dirty = stats.moved() || stats.activated > 0;

        if stats.activated > 0 {
            log::trace!(
                "foliage: {} needles launched, {} in flight",
                stats.activated,
                stats.in_flight
            );
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::seeded_rng;

    fn small_foliage(count: usize) -> Foliage {
        let config = FoliageConfig::default().with_count(count);
        Foliage::new(config, &mut seeded_rng(Some(11))).unwrap()
    }

    #[test]
    fn test_slots_start_on_tree() {
        let foliage = small_foliage(200);
        assert_eq!(foliage.len(), 200);
        for i in 0..200 {
            assert_eq!(foliage.slots()[i], foliage.tree_position(i));
            assert!((foliage.chaos_position(i).length() - 30.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_display_blends_chaos_to_tree() {
        let mut foliage = small_foliage(50);
        // scattered: sits on the chaos shell, give or take sway
        let p = foliage.display_position(7, 0.0);
        assert!(p.distance(foliage.chaos_position(7)) < 0.05);

        foliage.assembly_mut().set_progress(1.0);
        let p = foliage.display_position(7, 0.0);
        assert!(p.distance(foliage.tree_position(7)) < 0.05);
    }

    #[test]
    fn test_step_advances_progress() {
        let mut foliage = small_foliage(10);
        let frame = FrameInput::new(0.0, 1.0 / 60.0).assembled(true);
        foliage.step(&frame);
        let expected = 1.5 / 60.0;
        assert!((foliage.assembly().progress() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_ignored_while_scattered() {
        let mut foliage = small_foliage(100);
        let pointer = Some(foliage.tree_position(0));
        let frame = FrameInput::new(0.0, 1.0 / 60.0).with_pointer(pointer);
        let stats = foliage.step(&frame);
        assert_eq!(stats.activated, 0);
        assert!(!foliage.frame(Mat4::IDENTITY).slots_dirty);
    }

    #[test]
    fn test_pointer_disperses_assembled_tree() {
        let mut foliage = small_foliage(2000);
        foliage.assembly_mut().set_progress(1.0);
        let pointer = Some(foliage.tree_position(0));
        let frame = FrameInput::new(0.0, 1.0 / 60.0)
            .with_pointer(pointer)
            .assembled(true);
        let stats = foliage.step(&frame);
        assert!(stats.activated >= 1);
        assert!(foliage.dispersal().is_active(0));
        assert!(foliage.frame(Mat4::IDENTITY).slots_dirty);
        assert_ne!(foliage.slots()[0], foliage.tree_position(0));
    }

    #[test]
    fn test_uniforms_carry_progress_and_colors() {
        let mut foliage = small_foliage(1);
        foliage.assembly_mut().set_progress(0.25);
        let u = foliage.uniforms(Mat4::IDENTITY);
        assert_eq!(u.progress, 0.25);
        assert_eq!(u.point_scale, 3.5);
        assert_eq!(u.color_low[3], 1.0);
        assert_eq!(u.view_proj, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_empty_layer() {
        let mut foliage = small_foliage(0);
        assert!(foliage.is_empty());
        let stats = foliage.step(&FrameInput::new(0.0, 0.016).assembled(true));
        assert_eq!(stats, DispersalStats::default());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = FoliageConfig {
            height: 0.0,
            ..FoliageConfig::default()
        };
        assert!(Foliage::new(config, &mut seeded_rng(Some(1))).is_err());
    }
}
