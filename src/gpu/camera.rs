//! Camera for viewing the cloud.

use glam::{Mat4, Vec3};

/// Orbit camera looking at the origin from a fixed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Camera {
    /// Camera on the +Z axis, `distance` units from the origin.
    pub fn new(distance: f32, fov_degrees: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target: Vec3::ZERO,
            fov_degrees,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Perspective projection. Far plane sits well behind the scene.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let far = (self.distance * 4.0).max(100.0);
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect.max(1e-3), 0.1, far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(30.0, 75.0)
    }
}
