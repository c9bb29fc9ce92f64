//! Fixed perspective camera and screen-space picking rays.

use glam::{Mat4, Vec3};

/// Camera position of the card scene.
pub const DEFAULT_EYE: Vec3 = Vec3::new(0.0, 0.0, 13.0);
/// Vertical field of view (degrees).
pub const DEFAULT_FOV_DEG: f32 = 25.0;

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone)]
pub struct SceneCamera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical FOV (rad).
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl SceneCamera {
    pub fn new() -> Self {
        Self {
            eye: DEFAULT_EYE,
            target: Vec3::ZERO,
            fov: DEFAULT_FOV_DEG.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World-space ray through pixel `(px, py)` of a `width × height` surface
    /// (origin top-left). `None` for an empty surface.
    pub fn screen_ray(&self, px: f32, py: f32, width: f32, height: f32) -> Option<Ray> {
        if !(width > 0.0 && height > 0.0) {
            return None;
        }
        let ndc_x = 2.0 * px / width - 1.0;
        let ndc_y = 1.0 - 2.0 * py / height;
        let inv = self.view_projection(width / height).inverse();
        // wgpu clip depth runs 0 (near) .. 1 (far)
        let near = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        let direction = (far - near).try_normalize()?;
        Some(Ray {
            origin: near,
            direction,
        })
    }
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Hit point on the plane `z = depth`, if it lies ahead of the origin.
    pub fn intersect_z_plane(&self, depth: f32) -> Option<Vec3> {
        if self.direction.z.abs() < 1e-6 {
            return None;
        }
        let t = (depth - self.origin.z) / self.direction.z;
        (t >= 0.0).then(|| self.origin + self.direction * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_hits_origin() {
        let cam = SceneCamera::new();
        let ray = cam.screen_ray(400.0, 300.0, 800.0, 600.0).unwrap();
        let hit = ray.intersect_z_plane(0.0).unwrap();
        assert!(hit.length() < 1e-3, "hit {:?}", hit);
        assert!(ray.direction.z < -0.99);
    }

    #[test]
    fn test_edge_rays_span_fov() {
        let cam = SceneCamera::new();
        let half_h = 13.0 * (12.5f32).to_radians().tan();

        let top = cam.screen_ray(400.0, 0.0, 800.0, 600.0).unwrap();
        let hit = top.intersect_z_plane(0.0).unwrap();
        assert!((hit.y - half_h).abs() < 5e-3);
        assert!(hit.x.abs() < 1e-3);

        let right = cam.screen_ray(800.0, 300.0, 800.0, 600.0).unwrap();
        let hit = right.intersect_z_plane(0.0).unwrap();
        assert!((hit.x - half_h * 800.0 / 600.0).abs() < 5e-3);
    }

    #[test]
    fn test_degenerate_inputs() {
        let cam = SceneCamera::new();
        assert!(cam.screen_ray(0.0, 0.0, 0.0, 600.0).is_none());

        let parallel = Ray {
            origin: Vec3::ZERO,
            direction: Vec3::X,
        };
        assert!(parallel.intersect_z_plane(1.0).is_none());

        let away = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            direction: Vec3::Z,
        };
        assert!(away.intersect_z_plane(0.0).is_none());
    }
}
