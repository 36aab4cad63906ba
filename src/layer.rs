//! The per-frame contract shared by every visual layer.

use crate::dispersal::DispersalStats;
use glam::Vec3;

/// What a layer is told each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    /// Seconds since the scene started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Interaction point in tree-local space, if the pointer is over the tree.
    pub pointer: Option<Vec3>,
    /// Whether the tree should be assembled.
    pub assembled: bool,
}

impl FrameInput {
    pub fn new(elapsed: f32, delta: f32) -> Self {
        Self {
            elapsed,
            delta,
            pointer: None,
            assembled: false,
        }
    }

    pub fn with_pointer(mut self, pointer: Option<Vec3>) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn assembled(mut self, assembled: bool) -> Self {
        self.assembled = assembled;
        self
    }
}

/// A layer of entities whose positions are recomputed every frame.
///
/// Needles evaluate a closed-form blend and hold almost no per-entity state;
/// ornaments integrate their own position. Both answer the same questions.
pub trait PositionProvider {
    /// Number of entities. Fixed at creation.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Displayed position of entity `index` after the last step.
    fn position(&self, index: usize) -> Vec3;

    /// Where entity `index` rests when the tree is assembled.
    fn tree_position(&self, index: usize) -> Vec3;

    /// Where entity `index` rests when the tree is scattered.
    fn chaos_position(&self, index: usize) -> Vec3;

    /// Advance one frame.
    fn step(&mut self, frame: &FrameInput) -> DispersalStats;
}
