//! Point distributions for the two arrangements of the tree.
//!
//! Every entity gets two resting coordinates at creation: a *chaos* point on a
//! sphere shell and a *tree* point on a spiral wound around a cone. The
//! functions here produce those points; they hold no state of their own and
//! draw all randomness from the generator passed in.
//!
//! # Cone geometry
//!
//! The height fraction `p` runs from 0 at the base to 1 at the apex. The
//! local radius is `(1 - p) * radius`, so the cone tapers to a point, and
//! `y` maps linearly onto `[-height/2, height/2]`.
//!
//! ```ignore
//! let mut rng = seeded_rng(Some(7));
//! let needles = tree_points(&mut rng, 30_000, 6.0, 14.0);
//! let baubles = ornament_points(&mut rng, 200, 5.5, 13.0);
//! ```

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

/// Height-bias exponent for ornaments.
pub const ORNAMENT_BIAS: f32 = 3.5;

/// Spiral and jitter parameters for one horizontal band of the cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// The band applies where the height fraction is strictly above this value.
    pub above: f32,
    /// Half-turns of the spiral per unit of height fraction.
    pub spiral_density: f32,
    /// Full width of the radial jitter, as a fraction of the local radius.
    pub radial_jitter: f32,
    /// Full width of the vertical jitter, in world units.
    pub vertical_jitter: f32,
    /// Maximum angular offset added to the spiral angle, in radians.
    pub angle_jitter: f32,
}

/// Bands for the dense needle cloud. The upper 40% winds tighter and
/// scatters wider.
pub const NEEDLE_BANDS: [Band; 2] = [
    Band {
        above: f32::NEG_INFINITY,
        spiral_density: 30.0,
        radial_jitter: 0.3,
        vertical_jitter: 0.15,
        angle_jitter: 0.5,
    },
    Band {
        above: 0.6,
        spiral_density: 40.0,
        radial_jitter: 0.5,
        vertical_jitter: 0.25,
        angle_jitter: 0.5,
    },
];

/// Bands for sparse ornaments: coarse near the base, fine near the apex.
pub const ORNAMENT_BANDS: [Band; 3] = [
    Band {
        above: f32::NEG_INFINITY,
        spiral_density: 12.0,
        radial_jitter: 0.25,
        vertical_jitter: 0.4,
        angle_jitter: 1.0,
    },
    Band {
        above: 0.3,
        spiral_density: 16.0,
        radial_jitter: 0.18,
        vertical_jitter: 0.3,
        angle_jitter: 0.8,
    },
    Band {
        above: 0.7,
        spiral_density: 20.0,
        radial_jitter: 0.1,
        vertical_jitter: 0.15,
        angle_jitter: 0.6,
    },
];

/// Returns the band covering height fraction `p`.
///
/// Fractions at or below every threshold fall into the first band.
///
/// # Panics
///
/// Panics if `bands` is empty.
pub fn band_for(bands: &[Band], p: f32) -> &Band {
    assert!(!bands.is_empty(), "band table must not be empty");
    bands
        .iter()
        .rev()
        .find(|band| p > band.above)
        .unwrap_or(&bands[0])
}

/// Build the generator every layer draws from.
///
/// A fixed seed reproduces a scene exactly. Without one the generator is
/// seeded from the clock, so each run scatters differently.
pub fn seeded_rng(seed: Option<u64>) -> SmallRng {
    let seed = seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    });
    SmallRng::seed_from_u64(seed)
}

/// Random value in `[-0.5, 0.5)`.
#[inline]
pub(crate) fn centered(rng: &mut impl Rng) -> f32 {
    rng.gen::<f32>() - 0.5
}

/// Normalize `v`, falling back to `+Y` for a zero-length or non-finite vector.
#[inline]
pub fn unit_or_up(v: Vec3) -> Vec3 {
    v.try_normalize().unwrap_or(Vec3::Y)
}

/// Height of the cone slot for `index`, before vertical jitter.
///
/// Non-decreasing in `index`. With `total == 0` this is the apex.
pub fn cone_level(index: usize, total: usize, height: f32) -> f32 {
    let p = if total == 0 {
        1.0
    } else {
        index as f32 / total as f32
    };
    (p - 0.5) * height
}

/// Scattered resting point: a uniformly random direction scaled to `radius`.
///
/// Every sample lies exactly on the sphere shell. The result is uniform in
/// direction only, which is fine for scattering but not for volume sampling.
pub fn chaos_point(rng: &mut impl Rng, radius: f32) -> Vec3 {
    let dir = Vec3::new(centered(rng), centered(rng), centered(rng));
    unit_or_up(dir) * radius
}

/// Needle slot `index` of `total` on the tree cone.
///
/// Precondition: `index < total`. With `total == 0` the apex is returned
/// rather than dividing by zero.
pub fn cone_point(rng: &mut impl Rng, index: usize, total: usize, radius: f32, height: f32) -> Vec3 {
    if total == 0 {
        return Vec3::new(0.0, height * 0.5, 0.0);
    }
    let p = index as f32 / total as f32;
    place_on_cone(rng, p, radius, height, &NEEDLE_BANDS)
}

/// Height fraction for ornament `index` of `total`.
///
/// `p = 1 - (1 - u)^(1/k)` with `u = index/total`. Surface area of a cone
/// grows toward the base, so most ornaments (about 91% for `k = 3.5`) land in
/// the lower half.
pub fn ornament_fraction(index: usize, total: usize) -> f32 {
    if total == 0 {
        return 1.0;
    }
    let u = index as f32 / total as f32;
    1.0 - (1.0 - u).powf(1.0 / ORNAMENT_BIAS)
}

/// Ornament slot `index` of `total`, biased toward the base of the cone.
///
/// Precondition: `index < total`. With `total == 0` the apex is returned.
pub fn ornament_point(rng: &mut impl Rng, index: usize, total: usize, radius: f32, height: f32) -> Vec3 {
    if total == 0 {
        return Vec3::new(0.0, height * 0.5, 0.0);
    }
    let p = ornament_fraction(index, total);
    place_on_cone(rng, p, radius, height, &ORNAMENT_BANDS)
}

fn place_on_cone(rng: &mut impl Rng, p: f32, radius: f32, height: f32, bands: &[Band]) -> Vec3 {
    let band = band_for(bands, p);
    let y = (p - 0.5) * height;
    let r = (1.0 - p) * radius;

    let theta = p * PI * band.spiral_density + rng.gen::<f32>() * band.angle_jitter;
    let jittered = r + centered(rng) * r * band.radial_jitter;
    let y_offset = centered(rng) * band.vertical_jitter;

    Vec3::new(jittered * theta.cos(), y + y_offset, jittered * theta.sin())
}

/// `total` scattered points on a shell of `radius`.
pub fn chaos_points(rng: &mut impl Rng, total: usize, radius: f32) -> Vec<Vec3> {
    (0..total).map(|_| chaos_point(rng, radius)).collect()
}

/// All `total` needle slots. Empty for `total == 0`.
pub fn tree_points(rng: &mut impl Rng, total: usize, radius: f32, height: f32) -> Vec<Vec3> {
    (0..total)
        .map(|i| cone_point(rng, i, total, radius, height))
        .collect()
}

/// All `total` ornament slots. Empty for `total == 0`.
pub fn ornament_points(rng: &mut impl Rng, total: usize, radius: f32, height: f32) -> Vec<Vec3> {
    (0..total)
        .map(|i| ornament_point(rng, i, total, radius, height))
        .collect()
}
