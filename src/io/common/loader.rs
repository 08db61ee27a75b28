use std::ops::{BitOr, BitOrAssign};

use crate::rendering::common::texture_format::EngineFormat;

/// Opaque handle of a texture living on the host's device. Never interpreted by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceTextureHandle(pub u64);

/// Flags exchanged with the host when loading texture data. Request flags (`ALPHA`) come from
/// the host, the remaining ones are filled in when populating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureFlags(pub u32);

impl TextureFlags {
    pub const NONE: TextureFlags = TextureFlags(0);
    pub const NORMAL_MAP: TextureFlags = TextureFlags(1 << 0);
    pub const HAS_ATTACHED_ALPHA: TextureFlags = TextureFlags(1 << 1);
    pub const SPLITTED: TextureFlags = TextureFlags(1 << 2);
    pub const SRGB_READ: TextureFlags = TextureFlags(1 << 3);
    /// Request flag: the host wants the attached alpha (gloss) of a normal map.
    pub const ALPHA: TextureFlags = TextureFlags(1 << 8);

    pub fn contains(self, other: TextureFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TextureFlags {
    type Output = TextureFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        TextureFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TextureFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Pixel data handed to or received from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureLoadData {
    pub width: u32,
    pub height: u32,
    pub num_mips: u32,
    pub format: EngineFormat,
    pub flags: TextureFlags,
    pub data: Vec<u8>,
}

/// Everything the material system needs from the host engine.
///
/// Failures are reported through the return values only, implementations are expected to log
/// the details themselves.
pub trait HostServices {
    fn read_file(&self, path: &str) -> Option<Vec<u8>>;

    fn write_file(&self, path: &str, data: &[u8]) -> bool;

    fn remove_file(&self, path: &str) -> bool;

    /// Loads an external image, used to feed image inputs.
    fn read_texture(&self, path: &str) -> Option<TextureLoadData>;

    fn add_ref_device_texture(&self, texture: DeviceTextureHandle);

    fn release_device_texture(&self, texture: DeviceTextureHandle);

    fn reload_device_texture(&self, texture: DeviceTextureHandle);
}
