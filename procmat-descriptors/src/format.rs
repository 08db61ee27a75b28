use serde_derive::{Deserialize, Serialize};

/// Pixel layout of a rendered output, as produced by the renderer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    #[default]
    Rgba8,
    Rgbx8,
    Rgb8,
    L8,
    Rgba16,
    Rgbx16,
    Rgb16,
    L16,
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Pvrtc2,
    Pvrtc4,
}

impl PixelFormat {
    /// Edge length of a compression block, 1 for uncompressed formats.
    pub fn block_dim(self) -> u32 {
        match self {
            PixelFormat::Bc1 | PixelFormat::Bc2 | PixelFormat::Bc3 | PixelFormat::Bc4 | PixelFormat::Bc5 => 4,
            PixelFormat::Pvrtc2 | PixelFormat::Pvrtc4 => 8,
            _ => 1,
        }
    }

    /// 0 means the engine cannot size this format (it has no engine counterpart).
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgba16 => 64,
            PixelFormat::Rgba8 | PixelFormat::Rgbx8 => 32,
            PixelFormat::Rgb8 => 24,
            PixelFormat::L8 | PixelFormat::Bc2 | PixelFormat::Bc3 | PixelFormat::Bc5 => 8,
            PixelFormat::Bc1 | PixelFormat::Bc4 | PixelFormat::Pvrtc4 => 4,
            PixelFormat::Pvrtc2 => 2,
            PixelFormat::Rgbx16 | PixelFormat::Rgb16 | PixelFormat::L16 => 0,
        }
    }

    pub fn is_compressed(self) -> bool {
        self.block_dim() > 1
    }

    pub fn is_luminance(self) -> bool {
        matches!(self, PixelFormat::L8 | PixelFormat::L16)
    }
}
