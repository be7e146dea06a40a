// assets.rs: 后台线程解码六张图片，并在全部到齐后一次性交付

use crate::layout::{ImageMetadata, WallId};
use image::io::Reader as ImageReader;
use image::{GenericImageView, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Wall,
    /// Alpha-tested layer (balustrade) drawn in front of a wall.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetSlot {
    pub kind: SurfaceKind,
    pub wall: WallId,
}

impl AssetSlot {
    pub const ALL: [AssetSlot; 6] = [
        AssetSlot::wall(WallId::Back),
        AssetSlot::wall(WallId::Left),
        AssetSlot::wall(WallId::Right),
        AssetSlot::overlay(WallId::Back),
        AssetSlot::overlay(WallId::Left),
        AssetSlot::overlay(WallId::Right),
    ];

    pub const fn wall(wall: WallId) -> Self {
        Self {
            kind: SurfaceKind::Wall,
            wall,
        }
    }

    pub const fn overlay(wall: WallId) -> Self {
        Self {
            kind: SurfaceKind::Overlay,
            wall,
        }
    }

    /// Position in [`AssetSlot::ALL`].
    pub fn index(self) -> usize {
        let base = match self.kind {
            SurfaceKind::Wall => 0,
            SurfaceKind::Overlay => 3,
        };
        base + self.wall.index()
    }

    pub fn file_name(self) -> &'static str {
        match (self.kind, self.wall) {
            (SurfaceKind::Wall, WallId::Back) => "wall-center.png",
            (SurfaceKind::Wall, WallId::Left) => "wall-left.png",
            (SurfaceKind::Wall, WallId::Right) => "wall-right.png",
            (SurfaceKind::Overlay, WallId::Back) => "balustrade-centre.png",
            (SurfaceKind::Overlay, WallId::Left) => "balustrade-left.png",
            (SurfaceKind::Overlay, WallId::Right) => "balustrade-right.png",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomAssetPaths {
    paths: [PathBuf; 6],
}

impl RoomAssetPaths {
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            paths: AssetSlot::ALL.map(|slot| dir.join(slot.file_name())),
        }
    }

    pub fn path(&self, slot: AssetSlot) -> &Path {
        &self.paths[slot.index()]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Which folder-open request this belongs to.
    pub generation: u64,
    pub slot: AssetSlot,
    pub metadata: ImageMetadata,
    pub pixels: RgbaImage,
}

/// Decode one image file into RGBA pixels plus its pixel size.
pub fn load_image(path: &Path) -> Result<(ImageMetadata, RgbaImage), AssetError> {
    let file = File::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let img = ImageReader::new(reader)
        .with_guessed_format()
        .map_err(image::ImageError::IoError)
        .and_then(|mut r| {
            r.no_limits();
            r.decode()
        })
        .map_err(|source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let (w, h) = img.dimensions();
    Ok((ImageMetadata::new(path, w, h), img.to_rgba8()))
}

/// One background thread per image; each result is sent as soon as it decodes.
///
/// A failed load is logged and never sent, so the room stays unassembled.
pub fn start_load_room(paths: &RoomAssetPaths, generation: u64, tx: Sender<LoadedImage>) {
    for slot in AssetSlot::ALL {
        let path = paths.path(slot).to_path_buf();
        let tx = tx.clone();
        thread::spawn(move || {
            log::info!("loading {:?} from {}", slot, path.display());
            match load_image(&path) {
                Ok((metadata, pixels)) => {
                    log::info!(
                        "{} is {}x{}",
                        path.display(),
                        metadata.pixel_width,
                        metadata.pixel_height
                    );
                    let loaded = LoadedImage {
                        generation,
                        slot,
                        metadata,
                        pixels,
                    };
                    if tx.send(loaded).is_err() {
                        log::error!("viewer closed before {} arrived", path.display());
                    }
                }
                Err(e) => log::error!("{e}"),
            }
        });
    }
}

/// All six images of one room, in [`AssetSlot::ALL`] order.
#[derive(Debug, Clone)]
pub struct RoomAssets {
    pub images: [LoadedImage; 6],
}

impl RoomAssets {
    pub fn get(&self, slot: AssetSlot) -> &LoadedImage {
        &self.images[slot.index()]
    }

    pub fn metadata(&self, kind: SurfaceKind) -> [ImageMetadata; 3] {
        WallId::ALL.map(|wall| self.get(AssetSlot { kind, wall }).metadata.clone())
    }
}

/// Join point for the per-image loader threads.
#[derive(Debug, Default)]
pub struct RoomGather {
    generation: u64,
    slots: [Option<LoadedImage>; 6],
}

impl RoomGather {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            slots: Default::default(),
        }
    }

    /// Forget anything collected and wait for `generation` instead.
    pub fn restart(&mut self, generation: u64) {
        *self = Self::new(generation);
    }

    pub fn pending(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    /// Store an arrival; hands back the full room once the last slot fills.
    pub fn accept(&mut self, image: LoadedImage) -> Option<RoomAssets> {
        if image.generation != self.generation {
            log::debug!(
                "dropping {:?} from stale load {} (current {})",
                image.slot,
                image.generation,
                self.generation
            );
            return None;
        }

        let index = image.slot.index();
        self.slots[index] = Some(image);

        match std::mem::take(&mut self.slots) {
            [Some(a), Some(b), Some(c), Some(d), Some(e), Some(f)] => Some(RoomAssets {
                images: [a, b, c, d, e, f],
            }),
            partial => {
                self.slots = partial;
                None
            }
        }
    }
}
