// scene.rs: 把布局结果组装成可绘制的平面列表

use crate::assets::{RoomAssets, SurfaceKind};
use crate::config::RoomConfig;
use crate::layout::{compute_overlay_layout, compute_wall_layout, LayoutError, WallId, WallSpec};
use glam::{Mat4, Vec3};

/// Overlay fragments below this alpha are discarded.
pub const OVERLAY_ALPHA_CUTOFF: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSurface {
    pub kind: SurfaceKind,
    pub spec: WallSpec,
    /// `None` draws the surface opaque.
    pub alpha_cutoff: Option<f32>,
}

impl SceneSurface {
    /// Unit quad (-0.5..0.5 in x/y) to enclosure space.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::new(self.spec.world_width, self.spec.world_height, 1.0),
            self.spec.rotation(),
            self.spec.position,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomScene {
    walls: [WallSpec; 3],
    overlays: [WallSpec; 3],
}

impl RoomScene {
    /// The pickable set.
    pub fn walls(&self) -> &[WallSpec; 3] {
        &self.walls
    }

    /// Walls first, then overlays, so blended overlays draw over what is behind them.
    pub fn surfaces(&self) -> [SceneSurface; 6] {
        let walls = self.walls.map(|spec| SceneSurface {
            kind: SurfaceKind::Wall,
            spec,
            alpha_cutoff: None,
        });
        let overlays = self.overlays.map(|spec| SceneSurface {
            kind: SurfaceKind::Overlay,
            spec,
            alpha_cutoff: Some(OVERLAY_ALPHA_CUTOFF),
        });
        [walls[0], walls[1], walls[2], overlays[0], overlays[1], overlays[2]]
    }
}

pub fn build_scene(assets: &RoomAssets, config: &RoomConfig) -> Result<RoomScene, LayoutError> {
    let walls = compute_wall_layout(&assets.metadata(SurfaceKind::Wall), &config.layout)?;
    let overlays = compute_overlay_layout(
        &assets.metadata(SurfaceKind::Overlay),
        &walls,
        &config.layout,
        &config.overlay,
    )?;

    for (kind, w) in walls
        .iter()
        .map(|w| ("wall", w))
        .chain(overlays.iter().map(|o| ("overlay", o)))
    {
        log::info!(
            "{:?} {kind} {:.2}x{:.2} at {:?}",
            w.id,
            w.world_width,
            w.world_height,
            w.position
        );
    }

    Ok(RoomScene { walls, overlays })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetSlot, LoadedImage};
    use crate::layout::ImageMetadata;
    use image::RgbaImage;

    fn assets(dims: [(u32, u32); 6]) -> RoomAssets {
        RoomAssets {
            images: std::array::from_fn(|i| {
                let slot = AssetSlot::ALL[i];
                LoadedImage {
                    generation: 0,
                    slot,
                    metadata: ImageMetadata::new(slot.file_name(), dims[i].0, dims[i].1),
                    pixels: RgbaImage::new(1, 1),
                }
            }),
        }
    }

    #[test]
    fn builds_walls_and_overlays() {
        let scene = build_scene(
            &assets([(800, 600), (400, 600), (400, 600), (800, 300), (400, 300), (400, 300)]),
            &RoomConfig::default(),
        )
        .unwrap();

        assert_eq!(scene.walls()[WallId::Back.index()].world_width, 4.0);

        let surfaces = scene.surfaces();
        assert_eq!(surfaces[3].spec.world_height, 3.0);
        assert!(surfaces[..3].iter().all(|s| s.kind == SurfaceKind::Wall && s.alpha_cutoff.is_none()));
        assert!(surfaces[3..]
            .iter()
            .all(|s| s.kind == SurfaceKind::Overlay && s.alpha_cutoff == Some(0.1)));
        assert_eq!(surfaces[4].spec.id, WallId::Left);
    }

    #[test]
    fn bad_overlay_fails_the_build() {
        let err = build_scene(
            &assets([(800, 600), (400, 600), (400, 600), (800, 0), (400, 300), (400, 300)]),
            &RoomConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, LayoutError::EmptyImage { wall: WallId::Back, height: 0, .. }));
    }

    #[test]
    fn model_matrix_maps_quad_corners_onto_the_wall() {
        let scene = build_scene(
            &assets([(800, 600), (400, 600), (400, 600), (800, 300), (400, 300), (400, 300)]),
            &RoomConfig::default(),
        )
        .unwrap();
        let left = scene.surfaces()[1];
        let m = left.model_matrix();

        // 本地 +x 端应落在背墙左边缘 (x=-2, z=-2)
        let corner = m.transform_point3(Vec3::new(0.5, 0.5, 0.0));
        assert!(corner.abs_diff_eq(Vec3::new(-2.0, 3.0, -2.0), 1e-5));
        let far = m.transform_point3(Vec3::new(-0.5, -0.5, 0.0));
        assert!(far.abs_diff_eq(Vec3::new(-2.0, 0.0, 0.0), 1e-5));
    }
}
