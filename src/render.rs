//! Buffers handed to the render adapter.
//!
//! The simulation never draws anything itself. Each frame it exposes a
//! [`RenderSnapshot`] of GPU-ready buffers that an adapter uploads with
//! `bytemuck::cast_slice` and draws however it likes.
//!
//! | Buffer | Layout | Changes |
//! |--------|--------|---------|
//! | [`FoliageVertex`] | 16 bytes per needle | never |
//! | needle slots (`[Vec3]`) | 12 bytes per needle | only while needles are dispersing |
//! | [`FoliageUniforms`] | 112 bytes | every frame |
//! | [`InstanceRaw`] | 64 bytes per ornament | every frame |
//! | [`LightRaw`] | 32 bytes per light | every frame |

use crate::ornaments::{OrnamentMaterial, OrnamentShape};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Convert `0xRRGGBB` into linear-ish float RGB in `[0, 1]`.
pub fn rgb_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

/// Static per-needle attributes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FoliageVertex {
    /// Scattered resting point.
    pub chaos: [f32; 3],
    /// Random value in `[0, 1)` driving sway phase and shading.
    pub seed: f32,
}

/// Uniform block for the foliage shader.
///
/// Layout matches `FoliageUniforms` in [`FOLIAGE_SHADER`](crate::foliage::FOLIAGE_SHADER).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FoliageUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub time: f32,
    /// Raw assembly progress; the shader applies the easing.
    pub progress: f32,
    pub point_scale: f32,
    pub _pad: f32,
    pub color_high: [f32; 4],
    pub color_low: [f32; 4],
}

/// One instanced ornament transform.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
}

impl InstanceRaw {
    /// Translation part of the transform.
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.model[3][0], self.model[3][1], self.model[3][2])
    }

    /// Uniform scale of the transform (length of the first basis column).
    pub fn scale(&self) -> f32 {
        Vec3::new(self.model[0][0], self.model[0][1], self.model[0][2]).length()
    }
}

impl From<Mat4> for InstanceRaw {
    fn from(m: Mat4) -> Self {
        Self {
            model: m.to_cols_array_2d(),
        }
    }
}

/// A point light.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LightRaw {
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: [f32; 3],
    /// Cutoff distance.
    pub distance: f32,
}

/// Foliage data for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FoliageFrame<'a> {
    pub uniforms: FoliageUniforms,
    /// Static attributes, one per needle.
    pub vertices: &'a [FoliageVertex],
    /// Live needle slots. Equal to the tree positions at rest.
    pub slots: &'a [Vec3],
    /// Whether `slots` changed this frame and needs re-uploading.
    pub slots_dirty: bool,
}

/// One instanced draw of ornaments sharing a mesh and material.
#[derive(Debug, Clone, Copy)]
pub struct OrnamentBatch<'a> {
    pub shape: OrnamentShape,
    pub material: &'a OrnamentMaterial,
    pub instances: &'a [InstanceRaw],
}

/// The star on top of the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarFrame {
    pub transform: InstanceRaw,
    pub light: LightRaw,
    pub visible: bool,
}

/// Per-frame counters, useful for overlays and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frame: u64,
    pub needles_in_flight: usize,
    pub ornaments_in_flight: usize,
    pub activated: usize,
    pub faults: usize,
}

/// Everything the render adapter needs to draw one frame.
///
/// Positions are in tree-local space; `tree_transform` places the tree in
/// the world.
#[derive(Debug, Clone)]
pub struct RenderSnapshot<'a> {
    pub elapsed: f32,
    pub tree_transform: Mat4,
    pub foliage: FoliageFrame<'a>,
    pub ornaments: Vec<OrnamentBatch<'a>>,
    pub star: StarFrame,
    pub star_lights: &'a [LightRaw],
    pub bows: &'a [InstanceRaw],
    pub stats: FrameStats,
}

impl RenderSnapshot<'_> {
    /// Total ornament instances across all batches.
    pub fn ornament_count(&self) -> usize {
        self.ornaments.iter().map(|b| b.instances.len()).sum()
    }
}

/// Something that turns snapshots into pixels.
///
/// Implementations own every GPU resource; the simulation only hands over
/// buffers.
pub trait RenderAdapter {
    /// Draw one frame.
    fn draw(&mut self, snapshot: &RenderSnapshot<'_>);
}
