// layout.rs: 由图片像素尺寸推导三面墙与栏杆叠层的世界坐标布局

use crate::config::{LayoutConfig, OverlayConfig};
use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WallId {
    Back,
    Left,
    Right,
}

impl WallId {
    /// Array order used by every `[_; 3]` in this module.
    pub const ALL: [WallId; 3] = [WallId::Back, WallId::Left, WallId::Right];

    pub fn index(self) -> usize {
        match self {
            WallId::Back => 0,
            WallId::Left => 1,
            WallId::Right => 2,
        }
    }

    /// Rotation about +Y that turns a plane facing +Z into this wall.
    pub fn yaw(self) -> f32 {
        match self {
            WallId::Back => 0.0,
            WallId::Left => FRAC_PI_2,
            WallId::Right => -FRAC_PI_2,
        }
    }

    /// Direction the wall faces, towards the room interior.
    pub fn normal(self) -> Vec3 {
        Quat::from_rotation_y(self.yaw()) * Vec3::Z
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub path: PathBuf,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl ImageMetadata {
    pub fn new(path: impl Into<PathBuf>, pixel_width: u32, pixel_height: u32) -> Self {
        Self {
            path: path.into(),
            pixel_width,
            pixel_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("{wall:?} image {path} has non-positive size {width}x{height}")]
    EmptyImage {
        wall: WallId,
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

/// A planar surface placed in the enclosure's frame. Walls and overlays share this shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallSpec {
    pub id: WallId,
    pub world_width: f32,
    pub world_height: f32,
    /// Center of the plane.
    pub position: Vec3,
    pub yaw_radians: f32,
}

pub type OverlaySpec = WallSpec;

impl WallSpec {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw_radians)
    }
}

struct Scaled {
    world_width: f32,
    world_height: f32,
}

/// Height normalised to the tallest image in the set; width keeps the image aspect
/// against the reference height.
fn normalise(images: &[ImageMetadata; 3], reference_height: f32) -> Result<[Scaled; 3], LayoutError> {
    for (wall, img) in WallId::ALL.into_iter().zip(images) {
        if img.pixel_width == 0 || img.pixel_height == 0 {
            return Err(LayoutError::EmptyImage {
                wall,
                path: img.path.clone(),
                width: img.pixel_width,
                height: img.pixel_height,
            });
        }
    }

    let max_pixel_height = images.iter().map(|i| i.pixel_height).max().unwrap_or(1) as f32;

    Ok(images.each_ref().map(|img| {
        let w = img.pixel_width as f32;
        let h = img.pixel_height as f32;
        Scaled {
            world_width: reference_height * (w / h),
            world_height: reference_height * (h / max_pixel_height),
        }
    }))
}

/// Lays the three wall images out as a back wall flanked by two side walls.
///
/// `images` is ordered as [`WallId::ALL`]. Every wall hangs from the same ceiling
/// (`reference_height`), and the side walls start exactly at the back wall's edges.
pub fn compute_wall_layout(
    images: &[ImageMetadata; 3],
    config: &LayoutConfig,
) -> Result<[WallSpec; 3], LayoutError> {
    let reference_height = config.reference_height;
    let [back, left, right] = normalise(images, reference_height)?;
    let ceiling_y = reference_height;
    let half_back = back.world_width / 2.0;

    let back_spec = WallSpec {
        id: WallId::Back,
        world_width: back.world_width,
        world_height: back.world_height,
        position: Vec3::new(0.0, ceiling_y - back.world_height / 2.0, -half_back),
        yaw_radians: WallId::Back.yaw(),
    };

    // 旋转后宽度方向变为 z 方向（深度）
    let left_spec = WallSpec {
        id: WallId::Left,
        world_width: left.world_width,
        world_height: left.world_height,
        position: Vec3::new(
            -half_back,
            ceiling_y - left.world_height / 2.0,
            -half_back + left.world_width / 2.0,
        ),
        yaw_radians: WallId::Left.yaw(),
    };

    let right_spec = WallSpec {
        id: WallId::Right,
        world_width: right.world_width,
        world_height: right.world_height,
        position: Vec3::new(
            half_back,
            ceiling_y - right.world_height / 2.0,
            -half_back + right.world_width / 2.0,
        ),
        yaw_radians: WallId::Right.yaw(),
    };

    Ok([back_spec, left_spec, right_spec])
}

/// Places each overlay in front of its wall, standing on the floor (y = 0).
///
/// Heights are normalised against the overlay set alone. Each overlay sits
/// `parallax_offset` along its wall's normal, plus that side's configured shift.
pub fn compute_overlay_layout(
    overlay_images: &[ImageMetadata; 3],
    walls: &[WallSpec; 3],
    layout: &LayoutConfig,
    overlay: &OverlayConfig,
) -> Result<[OverlaySpec; 3], LayoutError> {
    let sized = normalise(overlay_images, layout.reference_height)?;
    let half_back = walls[WallId::Back.index()].world_width / 2.0;

    Ok(WallId::ALL.map(|id| {
        let s = &sized[id.index()];
        let wall = &walls[id.index()];
        let in_front = wall.position + id.normal() * overlay.parallax_offset;

        // 背墙叠层居中；侧墙叠层从背墙边缘开始沿深度展开
        let anchor = match id {
            WallId::Back => Vec3::new(0.0, s.world_height / 2.0, in_front.z),
            WallId::Left | WallId::Right => Vec3::new(
                in_front.x,
                s.world_height / 2.0,
                -half_back + s.world_width / 2.0,
            ),
        };

        OverlaySpec {
            id,
            world_width: s.world_width,
            world_height: s.world_height,
            position: anchor + overlay.side_shift(id),
            yaw_radians: id.yaw(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn top_y(s: &WallSpec) -> f32 {
        s.position.y + s.world_height / 2.0
    }

    // 竖直边 (本地 x = -w/2, +w/2)，取平面中心高度
    fn side_edges(s: &WallSpec) -> (Vec3, Vec3) {
        let half = s.rotation() * Vec3::new(s.world_width / 2.0, 0.0, 0.0);
        (s.position - half, s.position + half)
    }

    fn imgs(dims: [(u32, u32); 3]) -> [ImageMetadata; 3] {
        let names = ["wall-center.png", "wall-left.png", "wall-right.png"];
        [0, 1, 2].map(|i| ImageMetadata::new(names[i], dims[i].0, dims[i].1))
    }

    fn walls(dims: [(u32, u32); 3]) -> [WallSpec; 3] {
        compute_wall_layout(&imgs(dims), &LayoutConfig::default()).unwrap()
    }

    const SAMPLES: [[(u32, u32); 3]; 5] = [
        [(800, 600), (400, 600), (400, 600)],
        [(1920, 1080), (640, 900), (1200, 450)],
        [(300, 1000), (1000, 300), (777, 333)],
        [(1, 1), (2, 3), (5, 7)],
        [(4096, 512), (512, 4096), (2048, 2048)],
    ];

    #[test]
    fn room_from_800x600_back_and_400x600_sides() {
        let [back, left, right] = walls([(800, 600), (400, 600), (400, 600)]);

        assert_eq!(back.world_height, 3.0);
        assert_eq!(back.world_width, 4.0);
        assert_eq!(back.position.z, -2.0);
        assert_eq!(back.position.y, 1.5);
        assert_eq!(back.yaw_radians, 0.0);

        assert_eq!(left.world_height, 3.0);
        assert_eq!(left.world_width, 2.0);
        assert_eq!(left.position.x, -2.0);
        assert_eq!(left.position.z, -1.0);
        assert_relative_eq!(left.yaw_radians.to_degrees(), 90.0);

        assert_eq!(right.world_width, 2.0);
        assert_eq!(right.position.x, 2.0);
        assert_relative_eq!(right.yaw_radians.to_degrees(), -90.0);
    }

    #[test]
    fn tallest_image_reaches_reference_height() {
        for dims in SAMPLES {
            let specs = walls(dims);
            let tallest = (0..3).max_by_key(|&i| dims[i].1).unwrap();
            assert_eq!(specs[tallest].world_height, 3.0, "{dims:?}");
            for s in &specs {
                assert!(s.world_height <= 3.0, "{dims:?}: {s:?}");
            }
        }
    }

    #[test]
    fn width_keeps_pixel_aspect_against_reference_height() {
        for dims in SAMPLES {
            for (s, (w, h)) in walls(dims).iter().zip(dims) {
                assert_relative_eq!(s.world_width / 3.0, w as f32 / h as f32, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn walls_share_one_ceiling() {
        for dims in SAMPLES {
            for s in walls(dims) {
                assert_abs_diff_eq!(top_y(&s), 3.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn corners_are_seamless() {
        for dims in SAMPLES {
            let [back, left, right] = walls(dims);
            let (back_left_edge, back_right_edge) = side_edges(&back);

            // 左墙 yaw=+90° 时本地 +x 端朝向背墙，右墙相反
            let (_, left_inner) = side_edges(&left);
            let (right_inner, _) = side_edges(&right);

            assert_abs_diff_eq!(left_inner.x, back_left_edge.x, epsilon = 1e-4);
            assert_abs_diff_eq!(left_inner.z, back_left_edge.z, epsilon = 1e-4);
            assert_abs_diff_eq!(right_inner.x, back_right_edge.x, epsilon = 1e-4);
            assert_abs_diff_eq!(right_inner.z, back_right_edge.z, epsilon = 1e-4);
        }
    }

    #[test]
    fn wall_normals_face_the_interior() {
        assert!(WallId::Back.normal().abs_diff_eq(Vec3::Z, 1e-6));
        assert!(WallId::Left.normal().abs_diff_eq(Vec3::X, 1e-6));
        assert!(WallId::Right.normal().abs_diff_eq(-Vec3::X, 1e-6));
    }

    #[test]
    fn zero_height_is_rejected() {
        let err = compute_wall_layout(&imgs([(800, 600), (400, 0), (400, 600)]), &LayoutConfig::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::EmptyImage { wall: WallId::Left, height: 0, .. }));

        let err = compute_wall_layout(&imgs([(0, 600), (400, 600), (400, 600)]), &LayoutConfig::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::EmptyImage { wall: WallId::Back, .. }));
    }

    #[test]
    fn overlays_normalise_against_their_own_set() {
        let w = walls([(800, 600), (400, 600), (400, 600)]);
        let overlays = imgs([(1600, 400), (800, 200), (400, 100)]);
        let o = compute_overlay_layout(&overlays, &w, &LayoutConfig::default(), &OverlayConfig::default())
            .unwrap();

        assert_eq!(o[0].world_height, 3.0);
        assert_eq!(o[1].world_height, 1.5);
        assert_eq!(o[2].world_height, 0.75);
        for s in &o {
            assert_relative_eq!(s.world_width, 12.0);
        }
    }

    #[test]
    fn overlays_sit_in_front_of_walls_with_side_shifts() {
        let w = walls([(800, 600), (400, 600), (400, 600)]);
        let overlays = imgs([(800, 300), (400, 300), (400, 300)]);
        let cfg = OverlayConfig::default();
        let [back, left, right] =
            compute_overlay_layout(&overlays, &w, &LayoutConfig::default(), &cfg).unwrap();

        // 背墙 z=-2，向内偏移 0.2
        assert!(back.position.abs_diff_eq(Vec3::new(0.0, 1.5, -1.8), 1e-5));
        assert_eq!(back.yaw_radians, 0.0);

        assert!(left.position.abs_diff_eq(Vec3::new(-1.8, 1.5, -0.15), 1e-5));
        assert_eq!(left.yaw_radians, w[1].yaw_radians);

        assert!(right.position.abs_diff_eq(Vec3::new(1.8, 1.5 - 0.4, 0.0), 1e-5));
        assert_eq!(right.yaw_radians, w[2].yaw_radians);
    }

    #[test]
    fn overlay_shifts_come_from_config() {
        let w = walls([(800, 600), (400, 600), (400, 600)]);
        let overlays = imgs([(800, 300), (400, 300), (400, 300)]);
        let cfg = OverlayConfig {
            parallax_offset: 0.5,
            back_shift: Vec3::new(0.0, 0.25, 0.0),
            left_shift: Vec3::ZERO,
            right_shift: Vec3::ZERO,
        };
        let [back, left, right] =
            compute_overlay_layout(&overlays, &w, &LayoutConfig::default(), &cfg).unwrap();

        assert!(back.position.abs_diff_eq(Vec3::new(0.0, 1.75, -1.5), 1e-5));
        assert!(left.position.abs_diff_eq(Vec3::new(-1.5, 1.5, 0.0), 1e-5));
        assert!(right.position.abs_diff_eq(Vec3::new(1.5, 1.5, 0.0), 1e-5));
    }

    #[test]
    fn empty_overlay_is_rejected() {
        let w = walls([(800, 600), (400, 600), (400, 600)]);
        let overlays = imgs([(800, 300), (400, 300), (0, 0)]);
        let err = compute_overlay_layout(&overlays, &w, &LayoutConfig::default(), &OverlayConfig::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::EmptyImage { wall: WallId::Right, .. }));
    }
}
