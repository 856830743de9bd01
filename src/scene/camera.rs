//! Perspective camera.

use glam::{Mat4, Vec3};

/// Vertical field of view of the viewer camera, in degrees.
pub const CAMERA_FOV_DEGREES: f32 = 45.0;
/// Near clip plane distance.
pub const CAMERA_NEAR: f32 = 0.1;
/// Far clip plane distance.
pub const CAMERA_FAR: f32 = 1000.0;

/// A right-handed perspective camera looking from `position` at `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Width / height
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    /// Camera at `position` looking down -Z, like a freshly created three.js camera.
    pub fn new(fov_degrees: f32, aspect: f32, near: f32, far: f32, position: Vec3) -> Self {
        Self {
            fov_degrees,
            aspect,
            near,
            far,
            position,
            target: position + Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    /// Vertical field of view in radians.
    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }

    /// Orient the camera towards `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Unit vector from the camera towards its target.
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
