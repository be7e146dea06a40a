// input.rs: 指针/滚轮事件分类为 点选、拖拽旋转、缩放

use crate::config::InputConfig;
use crate::layout::WallId;
use crate::picking::{Ray, WallPicker};
use crate::transition::ViewTransitionController;
use glam::Vec2;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    pub active: bool,
    pub last_x: f32,
    pub last_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Client pixels to normalized device coordinates (+y up). `None` for a collapsed viewport.
    pub fn to_ndc(&self, x: f32, y: f32) -> Option<Vec2> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            (x / self.width) * 2.0 - 1.0,
            -(y / self.height) * 2.0 + 1.0,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    /// A transition is running; input is locked out.
    Ignored,
    Picked(WallId),
    DragStarted,
}

pub struct InputController {
    drag: DragState,
    config: InputConfig,
}

impl InputController {
    pub fn new(config: InputConfig) -> Self {
        Self {
            drag: DragState::default(),
            config,
        }
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn pointer_down<P: WallPicker + ?Sized>(
        &mut self,
        x: f32,
        y: f32,
        viewport: Viewport,
        walls: &P,
        view: &mut ViewTransitionController,
        now_ms: f64,
    ) -> PointerAction {
        if view.is_running() {
            return PointerAction::Ignored;
        }

        if let Some(ndc) = viewport.to_ndc(x, y) {
            let ray = Ray::from_camera(ndc, view.camera(), view.fov_y(), view.aspect());
            if let Some(wall) = walls.pick(&ray, view.enclosure_rotation()) {
                log::debug!("picked {:?} at ({x}, {y})", wall.id);
                view.begin(&wall, now_ms);
                return PointerAction::Picked(wall.id);
            }
        }

        self.drag = DragState {
            active: true,
            last_x: x,
            last_y: y,
        };
        PointerAction::DragStarted
    }

    /// Orbits the enclosure. Returns whether the pose changed.
    pub fn pointer_move(&mut self, x: f32, y: f32, view: &mut ViewTransitionController) -> bool {
        if !self.drag.active {
            return false;
        }
        let Some(free) = view.free_mode() else {
            return false;
        };

        let dx = x - self.drag.last_x;
        let dy = y - self.drag.last_y;
        self.drag.last_x = x;
        self.drag.last_y = y;

        let max_pitch = self.config.max_pitch_degrees.to_radians();
        let rot = free.enclosure_rotation;
        rot.y += dx * self.config.drag_sensitivity;
        rot.x = (rot.x + dy * self.config.drag_sensitivity).clamp(-max_pitch, max_pitch);
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag.active = false;
    }

    /// `delta_y` uses browser wheel units: positive scrolls down and moves the camera away.
    pub fn wheel(&mut self, delta_y: f32, view: &mut ViewTransitionController) -> bool {
        let Some(free) = view.free_mode() else {
            return false;
        };

        let z = &mut free.camera.position.z;
        *z = (*z + delta_y * self.config.zoom_sensitivity)
            .clamp(self.config.min_distance, self.config.max_distance);
        true
    }
}
