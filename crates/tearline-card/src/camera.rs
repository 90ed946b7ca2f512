//! Fixed perspective camera framing the card

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardCamera {
    pub eye: [f32; 3],
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CardCamera {
    fn default() -> Self {
        Self {
            eye: [0.0, 0.0, 5.0],
            fov_y: 50.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CardCamera {
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::from_array(self.eye), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), aspect.max(1e-4), self.near, self.far)
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_projects_to_screen_centre() {
        let cam = CardCamera::default();
        let clip = cam.view_proj(16.0 / 9.0) * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn up_is_up() {
        let cam = CardCamera::default();
        let clip = cam.view_proj(1.0) * glam::Vec4::new(0.0, 1.0, 0.0, 1.0);
        assert!(clip.y / clip.w > 0.0);
    }
}
