// config.rs: 房间布局、相机与交互参数（可由 JSON 覆盖）

use crate::layout::WallId;
use glam::Vec3;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// World-space height reached by the tallest wall image.
    pub reference_height: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { reference_height: 3.0 }
    }
}

/// Overlay (balustrade) placement relative to its wall.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Distance in front of the parent wall, along the wall normal.
    pub parallax_offset: f32,
    pub back_shift: Vec3,
    pub left_shift: Vec3,
    pub right_shift: Vec3,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            parallax_offset: 0.2,
            back_shift: Vec3::ZERO,
            left_shift: Vec3::new(0.0, 0.0, -0.15),
            right_shift: Vec3::new(0.0, -0.4, 0.0),
        }
    }
}

impl OverlayConfig {
    pub fn side_shift(&self, wall: WallId) -> Vec3 {
        match wall {
            WallId::Back => self.back_shift,
            WallId::Left => self.left_shift,
            WallId::Right => self.right_shift,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub initial_position: Vec3,
    /// Multiplier on the wall-fit distance. Negative by default; the sign is kept as-is.
    pub padding_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            initial_position: Vec3::new(0.0, 1.0, 5.0),
            padding_factor: -0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Radians of enclosure rotation per dragged pixel.
    pub drag_sensitivity: f32,
    /// Camera distance change per wheel unit.
    pub zoom_sensitivity: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_pitch_degrees: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.01,
            zoom_sensitivity: 0.2 * 0.01,
            min_distance: 1.5,
            max_distance: 20.0,
            max_pitch_degrees: 45.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub duration_ms: f64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self { duration_ms: 1000.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    pub layout: LayoutConfig,
    pub overlay: OverlayConfig,
    pub camera: CameraConfig,
    pub input: InputConfig,
    pub transition: TransitionConfig,
}

fn require(ok: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid { field, reason })
    }
}

impl RoomConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Missing file falls back to defaults quietly; a broken one is logged and ignored.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let l = &self.layout;
        require(
            l.reference_height.is_finite() && l.reference_height > 0.0,
            "layout.reference_height",
            "must be positive",
        )?;

        let o = &self.overlay;
        require(
            o.parallax_offset.is_finite()
                && o.back_shift.is_finite()
                && o.left_shift.is_finite()
                && o.right_shift.is_finite(),
            "overlay",
            "must be finite",
        )?;

        let c = &self.camera;
        require(
            c.fov_degrees > 0.0 && c.fov_degrees < 180.0,
            "camera.fov_degrees",
            "must be within (0, 180)",
        )?;
        require(
            c.near > 0.0 && c.far > c.near,
            "camera.far",
            "must exceed a positive near plane",
        )?;
        require(
            c.initial_position.is_finite() && c.padding_factor.is_finite(),
            "camera",
            "must be finite",
        )?;

        let i = &self.input;
        require(
            i.drag_sensitivity.is_finite() && i.zoom_sensitivity.is_finite(),
            "input",
            "sensitivities must be finite",
        )?;
        require(
            i.min_distance.is_finite() && i.max_distance.is_finite() && i.min_distance <= i.max_distance,
            "input.min_distance",
            "must not exceed input.max_distance",
        )?;
        require(
            i.max_pitch_degrees >= 0.0 && i.max_pitch_degrees < 90.0,
            "input.max_pitch_degrees",
            "must be within [0, 90)",
        )?;

        require(
            self.transition.duration_ms.is_finite() && self.transition.duration_ms > 0.0,
            "transition.duration_ms",
            "must be positive",
        )
    }
}

/// `--flag <value>` from the command line, then the environment variable.
fn arg_or_env(args: impl IntoIterator<Item = String>, flag: &str, env_key: &str) -> Option<String> {
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        if a == flag {
            if let Some(v) = it.next() {
                return Some(v);
            }
        }
    }

    if let Ok(v) = std::env::var(env_key) {
        if !v.trim().is_empty() {
            return Some(v);
        }
    }

    None
}

/// Config path: `--config <file>`, `ROOM_VIEWER_CONFIG`, then `assets/room.json`.
pub fn resolve_config_path() -> PathBuf {
    arg_or_env(std::env::args(), "--config", "ROOM_VIEWER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets").join("room.json"))
}

/// Image folder: `--assets <dir>`, `ROOM_VIEWER_ASSETS`, then `assets`.
pub fn resolve_assets_dir() -> PathBuf {
    arg_or_env(std::env::args(), "--assets", "ROOM_VIEWER_ASSETS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("assets"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_room_constants() {
        let c = RoomConfig::default();
        assert_eq!(c.layout.reference_height, 3.0);
        assert_eq!(c.overlay.parallax_offset, 0.2);
        assert_eq!(c.overlay.side_shift(WallId::Left), Vec3::new(0.0, 0.0, -0.15));
        assert_eq!(c.overlay.side_shift(WallId::Right), Vec3::new(0.0, -0.4, 0.0));
        assert_eq!(c.overlay.side_shift(WallId::Back), Vec3::ZERO);
        assert_eq!(c.camera.padding_factor, -0.1);
        assert_eq!(c.transition.duration_ms, 1000.0);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let c = RoomConfig::from_json(
            r#"{ "layout": { "reference_height": 4.5 }, "overlay": { "left_shift": [0.0, 0.1, -0.3] } }"#,
        )
        .unwrap();
        assert_eq!(c.layout.reference_height, 4.5);
        assert_eq!(c.overlay.left_shift, Vec3::new(0.0, 0.1, -0.3));
        assert_eq!(c.overlay.parallax_offset, 0.2);
        assert_eq!(c.input, InputConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(RoomConfig::from_json("{}").unwrap(), RoomConfig::default());
    }

    #[test]
    fn rejects_bad_values() {
        let mut c = RoomConfig::default();
        c.layout.reference_height = 0.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "layout.reference_height", .. })
        ));

        let mut c = RoomConfig::default();
        c.input.min_distance = 30.0;
        assert!(c.validate().is_err());

        let mut c = RoomConfig::default();
        c.transition.duration_ms = 0.0;
        assert!(c.validate().is_err());

        let mut c = RoomConfig::default();
        c.camera.fov_degrees = f32::NAN;
        assert!(c.validate().is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RoomConfig::load(Path::new("definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn flag_wins_over_missing_env() {
        let args = ["room_viewer", "--assets", "/tmp/rooms/a"].map(String::from);
        assert_eq!(
            arg_or_env(args, "--assets", "ROOM_VIEWER_TEST_UNSET_KEY").as_deref(),
            Some("/tmp/rooms/a")
        );
        let args = ["room_viewer", "--assets"].map(String::from);
        assert_eq!(arg_or_env(args, "--assets", "ROOM_VIEWER_TEST_UNSET_KEY"), None);
    }
}
