//! Orbit camera auto-fitted to the structure's bounding sphere.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// GPU camera uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    /// Combined view-projection matrix, column-major.
    pub view_proj: [[f32; 4]; 4],
}

/// A simple orbit camera looking at a target point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    /// Look-at target (usually the structure centroid).
    pub target: Vec3,
    /// Distance from the target.
    pub distance: f32,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            distance: 50.0,
            fov_y: 45.0_f32.to_radians(),
        }
    }
}

impl OrbitCamera {
    /// Position the camera so the given bounding sphere fills the view
    /// with a small margin.
    pub fn fit(&mut self, center: Vec3, radius: f32) {
        self.target = center;
        let safe_radius = radius.max(1.0);
        self.distance = safe_radius / (self.fov_y * 0.5).tan() * 1.2;
    }

    /// Eye position on the +Z axis relative to the target.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.target + Vec3::new(0.0, 0.0, self.distance)
    }

    /// View-projection matrix for the given aspect ratio.
    #[must_use]
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let near = (self.distance * 0.01).max(0.01);
        let far = self.distance * 10.0;
        let proj = Mat4::perspective_rh(self.fov_y, aspect.max(1e-6), near, far);
        let view = Mat4::look_at_rh(self.eye(), self.target, Vec3::Y);
        proj * view
    }

    /// Pack into the GPU uniform layout.
    #[must_use]
    pub fn to_uniform(&self, aspect: f32) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj(aspect).to_cols_array_2d(),
        }
    }
}

/// Bounding sphere (centroid and max distance) of a vertex position set.
#[must_use]
pub fn bounding_sphere(positions: &[[f32; 3]]) -> (Vec3, f32) {
    if positions.is_empty() {
        return (Vec3::ZERO, 1.0);
    }
    let mut center = Vec3::ZERO;
    for p in positions {
        center += Vec3::from(*p);
    }
    center /= positions.len() as f32;
    let radius = positions
        .iter()
        .map(|p| Vec3::from(*p).distance(center))
        .fold(0.0_f32, f32::max);
    (center, radius.max(1e-3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_sphere_covers_all_points() {
        let points = vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 6.0, 0.0]];
        let (center, radius) = bounding_sphere(&points);
        for p in &points {
            assert!(Vec3::from(*p).distance(center) <= radius + 1e-4);
        }
    }

    #[test]
    fn fit_scales_distance_with_radius() {
        let mut small = OrbitCamera::default();
        let mut large = OrbitCamera::default();
        small.fit(Vec3::ZERO, 5.0);
        large.fit(Vec3::ZERO, 50.0);
        assert!(large.distance > small.distance);
    }

    #[test]
    fn view_proj_maps_target_in_front_of_camera() {
        let mut camera = OrbitCamera::default();
        camera.fit(Vec3::new(1.0, 2.0, 3.0), 10.0);
        let clip = camera.view_proj(1.5) * camera.target.extend(1.0);
        let ndc_z = clip.z / clip.w;
        assert!(ndc_z > 0.0 && ndc_z < 1.0, "target depth {ndc_z}");
    }
}
