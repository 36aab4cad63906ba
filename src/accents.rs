//! Decorations that are animated but never scatter: the star on top, the
//! twinkling lights around the tree, and bows.

use crate::render::{rgb_hex, InstanceRaw, LightRaw, StarFrame};
use glam::{Mat4, Quat, Vec3};
use rand::Rng;
use std::f32::consts::TAU;

/// The star at the apex.
///
/// Only visible while the tree is assembled. It spins about its facing axis
/// and carries a pulsing point light.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeStar {
    pub position: Vec3,
    pub color: [f32; 3],
    spin: f32,
    pulse: f32,
    visible: bool,
}

impl TreeStar {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            color: rgb_hex(0xFFD700),
            spin: 0.0,
            pulse: 1.0,
            visible: false,
        }
    }

    /// Pulse factor in `[0.4, 1.0]`.
    pub fn pulse(&self) -> f32 {
        self.pulse
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Advance to time `t`. The animation freezes while hidden.
    pub fn step(&mut self, t: f32, assembled: bool) -> StarFrame {
        self.visible = assembled;
        if assembled {
            self.spin = t * 0.3;
            self.pulse = (t * 3.0).sin() * 0.3 + 0.7;
        }
        self.frame()
    }

    /// Render data for the current state.
    pub fn frame(&self) -> StarFrame {
        let scale = if self.visible { 1.0 } else { 0.0 };
        StarFrame {
            transform: InstanceRaw::from(Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                Quat::from_rotation_z(self.spin),
                self.position,
            )),
            light: LightRaw {
                position: self.position.to_array(),
                intensity: 2.0 * self.pulse,
                color: self.color,
                distance: 15.0 + self.pulse * 5.0,
            },
            visible: self.visible,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Twinkle {
    speed: f32,
    phase: f32,
    base: f32,
}

/// Background point lights that fade in and out.
#[derive(Debug, Clone)]
pub struct StarLights {
    twinkles: Vec<Twinkle>,
    lights: Vec<LightRaw>,
}

impl StarLights {
    /// Scatter `count` lights in the volume above and around the tree.
    pub fn new(count: usize, rng: &mut impl Rng) -> Self {
        let color = rgb_hex(0x8A2BE2);
        let mut twinkles = Vec::with_capacity(count);
        let mut lights = Vec::with_capacity(count);
        for _ in 0..count {
            let position = [
                rng.gen_range(-15.0..15.0),
                rng.gen_range(5.0..25.0),
                rng.gen_range(-15.0..15.0),
            ];
            let twinkle = Twinkle {
                speed: rng.gen_range(0.5..2.5),
                phase: rng.gen_range(0.0..TAU),
                base: rng.gen_range(0.3..1.0),
            };
            lights.push(LightRaw {
                position,
                intensity: twinkle.base,
                color,
                distance: 8.0,
            });
            twinkles.push(twinkle);
        }
        Self { twinkles, lights }
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn lights(&self) -> &[LightRaw] {
        &self.lights
    }

    /// Update intensities and ranges for time `t`.
    pub fn step(&mut self, t: f32) -> &[LightRaw] {
        for (light, tw) in self.lights.iter_mut().zip(&self.twinkles) {
            let twinkle = (t * tw.speed + tw.phase).sin() * 0.5 + 0.5;
            light.intensity = tw.base * (0.2 + twinkle * 0.8);
            light.distance = 5.0 + twinkle * 3.0;
        }
        &self.lights
    }
}

/// A bow that bobs and sways on the assembled tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Bow {
    pub anchor: Vec3,
    pub color: [f32; 3],
    sway: f32,
    bob: f32,
    visible: bool,
}

impl Bow {
    pub fn new(anchor: Vec3) -> Self {
        Self {
            anchor,
            color: rgb_hex(0xFF1493),
            sway: 0.0,
            bob: 0.0,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Advance to time `t`, returning the bow's transform.
    pub fn step(&mut self, t: f32, assembled: bool) -> InstanceRaw {
        self.visible = assembled;
        if assembled {
            self.sway = (t * 0.5).sin() * 0.1;
            self.bob = (t * 1.5).sin() * 0.1;
        }
        let scale = if self.visible { 1.0 } else { 0.0 };
        InstanceRaw::from(Mat4::from_scale_rotation_translation(
            Vec3::splat(scale),
            Quat::from_rotation_y(self.sway),
            self.anchor + Vec3::new(0.0, self.bob, 0.0),
        ))
    }
}
