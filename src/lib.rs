//! # Evergreen - an assembling Christmas tree
//!
//! Tens of thousands of needles and a few thousand ornaments drift in a
//! scattered cloud, fly together into a cone-shaped tree on command, and
//! scatter locally when the pointer brushes against the formed tree.
//!
//! Evergreen owns the simulation only. Every frame it hands a
//! [`RenderSnapshot`] of `bytemuck`-ready buffers to a [`RenderAdapter`], which
//! does the actual drawing.
//!
//! ## Quick Start
//!
//! ```ignore
//! use evergreen::prelude::*;
//!
//! let preset = VisualPreset::grand().with_seed(Some(7));
//! let mut scene = TreeScene::new(&preset)?;
//! let mut clock = FrameClock::fixed(1.0 / 60.0);
//!
//! scene.set_assembled(true);
//! loop {
//!     scene.handle_input(&input);
//!     input.begin_frame();
//!     let (elapsed, delta) = clock.update();
//!     adapter.draw(&scene.step(elapsed, delta));
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Two positions per entity
//!
//! Every entity has a *chaos* position (a point on a sphere shell) and a
//! *tree* position (on the cone). [`distribution`] generates both.
//!
//! ### Two ways to move
//!
//! - Needles ([`Foliage`]) are blended in closed form from a single shared
//!   [`AssemblyState`] progress value, eased with [`cubic_in_out`]. The GPU can
//!   evaluate the blend itself from [`foliage::FOLIAGE_SHADER`].
//! - Ornaments ([`OrnamentLayer`]) keep their own position and chase their
//!   destination at a speed set by their [`WeightTier`].
//!
//! Both implement [`PositionProvider`].
//!
//! ### Dispersal
//!
//! While the tree is assembled, entities near the interaction point are
//! launched outward ([`DispersalState`]), fly for a while under damping, and
//! snap back to their slot when their lifetime runs out.
//!
//! ## Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`distribution`] | chaos sphere, needle cone, bottom-heavy ornament cone |
//! | [`blend`] | assembly progress and easing |
//! | [`dispersal`] | pointer-driven scatter and return |
//! | [`foliage`], [`ornaments`], [`accents`] | the visual layers |
//! | [`interaction`], [`input`] | pointer to tree-local point, toggle gesture |
//! | [`scene`] | presets and the [`TreeScene`] root |
//! | [`render`] | buffers for the render adapter |

pub mod accents;
pub mod blend;
pub mod dispersal;
pub mod distribution;
pub mod error;
pub mod foliage;
pub mod input;
pub mod interaction;
pub mod layer;
pub mod ornaments;
pub mod render;
pub mod scene;
pub mod time;

pub use accents::{Bow, StarLights, TreeStar};
pub use blend::{cubic_in_out, lerp, AssemblyState};
pub use bytemuck;
pub use dispersal::{Damping, DispersalConfig, DispersalState, DispersalStats};
pub use error::{ConfigError, PresetError};
pub use foliage::{Foliage, FoliageConfig};
pub use glam::{Mat4, Quat, Vec2, Vec3};
pub use input::{Click, Input, MouseButton, ToggleGesture, ToggleTrigger};
pub use interaction::{OrbitCamera, Ray, TreeEnvelope};
pub use layer::{FrameInput, PositionProvider};
pub use ornaments::{OrnamentConfig, OrnamentLayer, OrnamentMaterial, OrnamentShape, WeightTier};
pub use render::{
    FoliageFrame, FoliageUniforms, FoliageVertex, FrameStats, InstanceRaw, LightRaw, OrnamentBatch,
    RenderAdapter, RenderSnapshot, StarFrame,
};
pub use scene::{OrnamentGroup, TreeScene, VisualPreset};
pub use time::FrameClock;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use evergreen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::distribution::seeded_rng;
    pub use crate::input::{Input, MouseButton, ToggleTrigger};
    pub use crate::layer::PositionProvider;
    pub use crate::render::{RenderAdapter, RenderSnapshot};
    pub use crate::scene::{OrnamentGroup, TreeScene, VisualPreset};
    pub use crate::time::FrameClock;
    pub use crate::{DispersalConfig, OrnamentShape, WeightTier};
    pub use crate::{Vec2, Vec3};
}
