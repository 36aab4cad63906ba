//! Mapping the pointer onto the tree.
//!
//! A cursor position becomes a world ray through the [`OrbitCamera`], the ray
//! is cut with the vertical plane through the tree axis, and
//! [`TreeEnvelope::project`] pushes the hit out onto the cone's surface on the
//! camera's side. The result is the interaction point that drives dispersal.

use glam::{Mat4, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_4, FRAC_PI_6};

/// Pitch range the camera may orbit through: an eighth of a turn above the
/// horizon down to a twelfth of a turn below it.
pub const PITCH_LIMITS: (f32, f32) = (-FRAC_PI_6, FRAC_PI_4);

/// A half-line in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the plane `normal · p = offset`, in front of the origin.
    pub fn intersect_plane(&self, normal: Vec3, offset: f32) -> Option<Vec3> {
        let denom = normal.dot(self.direction);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (offset - normal.dot(self.origin)) / denom;
        if t < 0.0 || !t.is_finite() {
            return None;
        }
        Some(self.at(t))
    }

    /// The same ray shifted by `-offset`, i.e. expressed relative to `offset`.
    pub fn relative_to(&self, offset: Vec3) -> Self {
        Self {
            origin: self.origin - offset,
            direction: self.direction,
        }
    }
}

/// Camera orbiting a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Idle rotation about the target, in radians per second.
    pub auto_rotate: f32,
}

impl OrbitCamera {
    /// Looking down -Z from 25 units away with a 45° field of view.
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 25.0,
            target: Vec3::ZERO,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 200.0,
            auto_rotate: 0.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn with_auto_rotate(mut self, radians_per_second: f32) -> Self {
        self.auto_rotate = radians_per_second;
        self
    }

    /// Orbit by the given angles, keeping the pitch within [`PITCH_LIMITS`].
    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw = (self.yaw + d_yaw) % std::f32::consts::TAU;
        self.pitch = (self.pitch + d_pitch).clamp(PITCH_LIMITS.0, PITCH_LIMITS.1);
    }

    /// Apply the idle rotation for one frame.
    pub fn advance(&mut self, delta: f32) {
        if self.auto_rotate != 0.0 {
            self.orbit(self.auto_rotate * delta, 0.0);
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    /// World ray through a cursor position given in pixels from the top-left.
    ///
    /// `None` for an empty viewport.
    pub fn screen_ray(&self, cursor: Vec2, viewport: Vec2) -> Option<Ray> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            (cursor.x / viewport.x) * 2.0 - 1.0,
            1.0 - (cursor.y / viewport.y) * 2.0,
        );
        let inverse = self.view_proj(viewport.x / viewport.y).inverse();
        let near = inverse.project_point3(ndc.extend(0.0));
        let far = inverse.project_point3(ndc.extend(1.0));
        let direction = (far - near).try_normalize()?;
        Some(Ray { origin: near, direction })
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new()
    }
}

/// The region around the tree that reacts to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeEnvelope {
    /// Base radius of the cone.
    pub radius: f32,
    pub height: f32,
    /// Horizontal reach as a multiple of `radius`.
    pub reach: f32,
}

impl Default for TreeEnvelope {
    fn default() -> Self {
        Self {
            radius: 6.0,
            height: 14.0,
            reach: 1.5,
        }
    }
}

impl TreeEnvelope {
    /// Cone radius at height `y`, zero above the apex.
    pub fn radius_at(&self, y: f32) -> f32 {
        (self.radius * (0.5 - y / self.height)).clamp(0.0, self.radius)
    }

    /// Whether a point on the axis plane falls inside the envelope.
    ///
    /// `lateral` is the signed sideways distance from the axis within the plane.
    pub fn contains(&self, lateral: f32, y: f32) -> bool {
        lateral.abs() < self.radius * self.reach && y.abs() < self.height * 0.5
    }

    /// Interaction point for a tree-local ray, or `None` if it misses.
    ///
    /// The ray is cut with the vertical plane through the axis that faces back
    /// along the ray, then the hit is pushed toward the viewer onto the cone
    /// surface at the same height.
    pub fn project(&self, ray: &Ray) -> Option<Vec3> {
        let facing = Vec3::new(-ray.direction.x, 0.0, -ray.direction.z)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        let hit = ray.intersect_plane(facing, 0.0)?;
        let across = Vec3::Y.cross(facing);
        let lateral = hit.dot(across);
        if !self.contains(lateral, hit.y) {
            return None;
        }
        let r = self.radius_at(hit.y);
        let lateral = lateral.clamp(-r, r);
        let depth = (r * r - lateral * lateral).max(0.0).sqrt();
        Some(across * lateral + facing * depth + Vec3::Y * hit.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    #[test]
    fn test_default_camera_position() {
        let camera = OrbitCamera::new();
        assert!(camera.position().distance(Vec3::new(0.0, 0.0, 25.0)) < 1e-5);
    }

    #[test]
    fn test_orbit_limits() {
        let mut camera = OrbitCamera::new().with_auto_rotate(0.5);
        camera.orbit(0.0, 3.0);
        assert_eq!(camera.pitch, PITCH_LIMITS.1);
        camera.orbit(0.0, -6.0);
        assert_eq!(camera.pitch, PITCH_LIMITS.0);

        camera.advance(2.0);
        assert!((camera.yaw - 1.0).abs() < 1e-6);
        assert!((camera.position().distance(camera.target) - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = OrbitCamera::new();
        let ray = camera.screen_ray(VIEWPORT * 0.5, VIEWPORT).unwrap();
        assert!(ray.direction.dot(-Vec3::Z) > 0.9999);
        assert!(camera.screen_ray(Vec2::ZERO, Vec2::ZERO).is_none());
    }

    #[test]
    fn test_plane_intersection() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 10.0), -Vec3::Z);
        assert_eq!(ray.intersect_plane(Vec3::Z, 0.0), Some(Vec3::new(1.0, 2.0, 0.0)));
        let away = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        assert!(away.intersect_plane(Vec3::Z, 0.0).is_none());
        let parallel = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::X);
        assert!(parallel.intersect_plane(Vec3::Z, 0.0).is_none());
    }

    #[test]
    fn test_project_onto_front_surface() {
        let envelope = TreeEnvelope::default();
        let ray = Ray::new(Vec3::new(0.0, -7.0 + 3.5, 25.0), -Vec3::Z);
        let point = envelope.project(&ray).unwrap();
        // a quarter of the way up the radius is 6 * 0.75
        assert!((point.z - 4.5).abs() < 1e-4);
        assert!(point.x.abs() < 1e-6);
        assert!((point.y + 3.5).abs() < 1e-6);
    }

    #[test]
    fn test_project_clamps_to_silhouette() {
        let envelope = TreeEnvelope::default();
        let ray = Ray::new(Vec3::new(8.0, 0.0, 25.0), -Vec3::Z);
        let point = envelope.project(&ray).unwrap();
        assert!((point.x - 3.0).abs() < 1e-5);
        assert!(point.z.abs() < 1e-3);
    }

    #[test]
    fn test_project_misses_outside_envelope() {
        let envelope = TreeEnvelope::default();
        let wide = Ray::new(Vec3::new(9.5, 0.0, 25.0), -Vec3::Z);
        assert!(envelope.project(&wide).is_none());
        let high = Ray::new(Vec3::new(0.0, 7.5, 25.0), -Vec3::Z);
        assert!(envelope.project(&high).is_none());
    }

    #[test]
    fn test_project_from_behind() {
        let envelope = TreeEnvelope::default();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -25.0), Vec3::Z);
        let point = envelope.project(&ray).unwrap();
        assert!((point.z + 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_screen_ray_through_envelope() {
        let camera = OrbitCamera::new();
        let envelope = TreeEnvelope::default();
        let ray = camera.screen_ray(VIEWPORT * 0.5, VIEWPORT).unwrap();
        let point = envelope.project(&ray).unwrap();
        assert!((point.z - 3.0).abs() < 1e-2);
    }

    #[test]
    fn test_project_follows_camera_yaw() {
        let envelope = TreeEnvelope::default();
        let mut camera = OrbitCamera::new();
        camera.yaw = std::f32::consts::FRAC_PI_2;

        // side-on camera at +X: the centre hits the +X face of the cone
        let ray = camera.screen_ray(VIEWPORT * 0.5, VIEWPORT).unwrap();
        let point = envelope.project(&ray).unwrap();
        assert!(point.distance(Vec3::new(3.0, 0.0, 0.0)) < 1e-2, "{:?}", point);

        for degrees in [0.0f32, 45.0, 80.0, 90.0, 100.0, 180.0, 270.0] {
            camera.yaw = degrees.to_radians();
            let eye = camera.position();
            let toward_eye = Vec3::new(eye.x, 0.0, eye.z).normalize();

            let ray = camera.screen_ray(VIEWPORT * 0.5 + Vec2::new(60.0, 0.0), VIEWPORT).unwrap();
            let point = envelope.project(&ray).unwrap_or_else(|| panic!("miss at yaw {}", degrees));
            let flat = Vec3::new(point.x, 0.0, point.z);
            assert!((flat.length() - 3.0).abs() < 1e-2);
            assert!(flat.normalize().dot(toward_eye) > 0.5, "yaw {}: {:?}", degrees, point);
        }
    }
}
