use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use log::{trace, warn};

use crate::io::common::loader::{DeviceTextureHandle, HostServices, TextureFlags, TextureLoadData};
use crate::rendering::common::texture_format::EngineFormat;

/// Extension of raw image dumps: tightly packed, square, RGBA8 without any header.
pub const RAW_IMAGE_EXTENSION: &str = "rgba";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceTextureState {
    pub references: usize,
    pub reloads: usize,
}

/// Host services backed by a directory on disk. Device textures only exist as bookkeeping.
pub struct FsHost {
    data_folder: PathBuf,
    device_textures: RwLock<HashMap<DeviceTextureHandle, DeviceTextureState>>,
}

impl FsHost {
    pub fn new(data_folder: &str) -> Self {
        Self {
            data_folder: PathBuf::from(data_folder),
            device_textures: RwLock::new(HashMap::new()),
        }
    }

    pub fn data_folder(&self) -> &Path {
        &self.data_folder
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.data_folder.join(path.replace('\\', "/"))
    }

    pub fn device_texture_state(&self, texture: DeviceTextureHandle) -> Option<DeviceTextureState> {
        self.device_textures
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&texture)
            .copied()
    }

    fn with_device_texture(&self, texture: DeviceTextureHandle, f: impl FnOnce(&mut DeviceTextureState)) {
        let mut textures = self
            .device_textures
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let state = textures.entry(texture).or_default();
        f(state);
        if state.references == 0 {
            textures.remove(&texture);
        }
    }
}

impl HostServices for FsHost {
    fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        match fs::read(self.resolve(path)) {
            Ok(buf) => {
                trace!("Loaded {} ({} bytes)", path, buf.len());
                Some(buf)
            }
            Err(err) => {
                warn!("FsHost: Failed to read {}: {}", path, err);
                None
            }
        }
    }

    fn write_file(&self, path: &str, data: &[u8]) -> bool {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("FsHost: Failed to create {}: {}", parent.display(), err);
                return false;
            }
        }

        match fs::write(&target, data) {
            Ok(()) => true,
            Err(err) => {
                warn!("FsHost: Failed to write {}: {}", path, err);
                false
            }
        }
    }

    fn remove_file(&self, path: &str) -> bool {
        match fs::remove_file(self.resolve(path)) {
            Ok(()) => true,
            Err(err) => {
                warn!("FsHost: Failed to remove {}: {}", path, err);
                false
            }
        }
    }

    fn read_texture(&self, path: &str) -> Option<TextureLoadData> {
        if !path.to_ascii_lowercase().ends_with(RAW_IMAGE_EXTENSION) {
            warn!("FsHost: Unsupported image format {}", path);
            return None;
        }

        let data = self.read_file(path)?;
        let texture = decode_raw_rgba(data);
        if texture.is_none() {
            warn!("FsHost: {} is not a square RGBA8 dump", path);
        }
        texture
    }

    fn add_ref_device_texture(&self, texture: DeviceTextureHandle) {
        self.with_device_texture(texture, |state| state.references += 1);
    }

    fn release_device_texture(&self, texture: DeviceTextureHandle) {
        self.with_device_texture(texture, |state| state.references = state.references.saturating_sub(1));
    }

    fn reload_device_texture(&self, texture: DeviceTextureHandle) {
        trace!("FsHost: Reloading device texture {:?}", texture);
        self.with_device_texture(texture, |state| state.reloads += 1);
    }
}

pub fn decode_raw_rgba(data: Vec<u8>) -> Option<TextureLoadData> {
    if data.is_empty() || data.len() % 4 != 0 {
        return None;
    }

    let pixels = data.len() / 4;
    let side = (pixels as f64).sqrt() as usize;
    if side * side != pixels {
        return None;
    }

    Some(TextureLoadData {
        width: side as u32,
        height: side as u32,
        num_mips: 1,
        format: EngineFormat::R8G8B8A8,
        flags: TextureFlags::NONE,
        data,
    })
}
