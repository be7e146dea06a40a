// transition.rs: 相机/房间姿态与"飞向墙面"的缓动过渡状态机

use crate::config::{CameraConfig, TransitionConfig};
use crate::easing::{ease_in_out_cubic, lerp};
use crate::layout::{WallId, WallSpec};
use glam::{EulerRot, Quat, Vec3};
use std::f32::consts::FRAC_PI_2;

/// Position plus XYZ Euler rotation (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Vec3) -> Self {
        Self { position, rotation }
    }

    pub fn quat(&self) -> Quat {
        euler_quat(self.rotation)
    }
}

pub fn euler_quat(rotation: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

/// Component-wise [`lerp`].
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    Vec3::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp(a.z, b.z, t))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    pub wall: WallId,
    pub start_camera: Pose,
    pub target_camera: Pose,
    pub start_enclosure_rotation: Vec3,
    pub target_enclosure_rotation: Vec3,
    pub start_time_ms: f64,
    pub duration_ms: f64,
}

impl TransitionState {
    pub fn progress(&self, now_ms: f64) -> f32 {
        let elapsed = now_ms - self.start_time_ms;
        (elapsed / self.duration_ms).clamp(0.0, 1.0) as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    Running(TransitionState),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Nothing in flight.
    None,
    Continue { progress: f32 },
    /// Reached the target this frame; the controller is idle again.
    Complete,
}

/// Camera pose that frames `wall` head-on.
///
/// `fov_y` is the vertical field of view in radians. The horizontal fit uses
/// `fov_y * aspect`, and the larger of the two fit distances is scaled by `padding_factor`.
pub fn target_camera_pose(wall: &WallSpec, fov_y: f32, aspect: f32, padding_factor: f32) -> Pose {
    let distance_for_width = (wall.world_width / 2.0) / (fov_y * aspect / 2.0).tan();
    let distance_for_height = (wall.world_height / 2.0) / (fov_y / 2.0).tan();
    let distance = distance_for_width.max(distance_for_height) * padding_factor;
    let eye_y = wall.world_height / 2.0;

    match wall.id {
        WallId::Back => Pose::new(Vec3::new(0.0, eye_y, distance), Vec3::ZERO),
        WallId::Left => Pose::new(Vec3::new(-distance, eye_y, 0.0), Vec3::new(0.0, FRAC_PI_2, 0.0)),
        WallId::Right => Pose::new(Vec3::new(distance, eye_y, 0.0), Vec3::new(0.0, -FRAC_PI_2, 0.0)),
    }
}

/// Mutable access to the live pose, only handed out while no transition runs.
pub struct FreeMode<'a> {
    pub camera: &'a mut Pose,
    pub enclosure_rotation: &'a mut Vec3,
}

/// Owns the live camera pose and enclosure rotation and drives wall-framing animations.
pub struct ViewTransitionController {
    camera: Pose,
    enclosure_rotation: Vec3,
    initial_camera: Pose,
    fov_y: f32,
    aspect: f32,
    padding_factor: f32,
    duration_ms: f64,
    phase: Phase,
}

impl ViewTransitionController {
    pub fn new(camera: &CameraConfig, transition: &TransitionConfig, aspect: f32) -> Self {
        let initial_camera = Pose::new(camera.initial_position, Vec3::ZERO);
        Self {
            camera: initial_camera,
            enclosure_rotation: Vec3::ZERO,
            initial_camera,
            fov_y: camera.fov_degrees.to_radians(),
            aspect,
            padding_factor: camera.padding_factor,
            duration_ms: transition.duration_ms,
            phase: Phase::Idle,
        }
    }

    pub fn camera(&self) -> &Pose {
        &self.camera
    }

    pub fn enclosure_rotation(&self) -> Vec3 {
        self.enclosure_rotation
    }

    pub fn fov_y(&self) -> f32 {
        self.fov_y
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    pub fn free_mode(&mut self) -> Option<FreeMode<'_>> {
        match self.phase {
            Phase::Idle => Some(FreeMode {
                camera: &mut self.camera,
                enclosure_rotation: &mut self.enclosure_rotation,
            }),
            Phase::Running(_) => None,
        }
    }

    /// Starts framing `wall`. Returns `false`, changing nothing, if a transition is already running.
    pub fn begin(&mut self, wall: &WallSpec, now_ms: f64) -> bool {
        if let Phase::Running(current) = &self.phase {
            log::warn!("ignoring {:?} pick, still moving to {:?}", wall.id, current.wall);
            return false;
        }

        let target_camera = target_camera_pose(wall, self.fov_y, self.aspect, self.padding_factor);
        log::debug!("transition to {:?}: {:?}", wall.id, target_camera);

        self.phase = Phase::Running(TransitionState {
            wall: wall.id,
            start_camera: self.camera,
            target_camera,
            start_enclosure_rotation: self.enclosure_rotation,
            // 过渡总是把房间转回正面
            target_enclosure_rotation: Vec3::ZERO,
            start_time_ms: now_ms,
            duration_ms: self.duration_ms,
        });
        true
    }

    /// Advances the running transition to `now_ms` and writes the blended pose.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        let Phase::Running(state) = self.phase else {
            return TickOutcome::None;
        };

        let progress = state.progress(now_ms);
        if progress >= 1.0 {
            self.camera = state.target_camera;
            self.enclosure_rotation = state.target_enclosure_rotation;
            self.phase = Phase::Idle;
            log::debug!("transition to {:?} finished", state.wall);
            return TickOutcome::Complete;
        }

        let eased = ease_in_out_cubic(progress);
        self.camera = Pose::new(
            lerp_vec3(state.start_camera.position, state.target_camera.position, eased),
            lerp_vec3(state.start_camera.rotation, state.target_camera.rotation, eased),
        );
        self.enclosure_rotation = lerp_vec3(
            state.start_enclosure_rotation,
            state.target_enclosure_rotation,
            eased,
        );
        TickOutcome::Continue { progress }
    }

    /// Back to the starting camera and a neutral enclosure. Ignored mid-transition.
    pub fn reset_view(&mut self) -> bool {
        let initial = self.initial_camera;
        match self.free_mode() {
            Some(free) => {
                *free.camera = initial;
                *free.enclosure_rotation = Vec3::ZERO;
                true
            }
            None => false,
        }
    }
}
