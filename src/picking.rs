// picking.rs: 屏幕射线与墙面的相交测试

use crate::layout::WallSpec;
use crate::transition::{euler_quat, Pose};
use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Ray through `ndc` for a perspective camera looking down its local -Z.
    pub fn from_camera(ndc: Vec2, camera: &Pose, fov_y: f32, aspect: f32) -> Self {
        let half_h = (fov_y / 2.0).tan();
        let local = Vec3::new(ndc.x * half_h * aspect, ndc.y * half_h, -1.0).normalize();
        Self {
            origin: camera.position,
            direction: camera.quat() * local,
        }
    }
}

/// Distance along `ray` to `wall`, with the wall living inside an enclosure rotated
/// by `enclosure_rotation` (XYZ Euler). Both faces count.
pub fn intersect_wall(ray: &Ray, wall: &WallSpec, enclosure_rotation: Vec3) -> Option<f32> {
    let to_enclosure = euler_quat(enclosure_rotation).inverse();
    let to_wall = wall.rotation().inverse();

    let o = to_wall * (to_enclosure * ray.origin - wall.position);
    let d = to_wall * (to_enclosure * ray.direction);

    // 与墙面平行
    if d.z.abs() < 1e-6 {
        return None;
    }

    let t = -o.z / d.z;
    if t <= 0.0 {
        return None;
    }

    let hit = o + d * t;
    let inside = hit.x.abs() <= wall.world_width / 2.0 && hit.y.abs() <= wall.world_height / 2.0;
    inside.then_some(t)
}

/// Pointer-ray test restricted to the pickable walls.
pub trait WallPicker {
    fn pick(&self, ray: &Ray, enclosure_rotation: Vec3) -> Option<WallSpec>;
}

impl WallPicker for [WallSpec] {
    fn pick(&self, ray: &Ray, enclosure_rotation: Vec3) -> Option<WallSpec> {
        self.iter()
            .filter_map(|w| intersect_wall(ray, w, enclosure_rotation).map(|t| (t, w)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, w)| *w)
    }
}
