use procmat_descriptors::format::PixelFormat;
use procmat_descriptors::package::ChannelUse;

use crate::rendering::common::types::RenderResult;
use crate::settings::CompressionProfile;

const BC5_BLOCK_SIZE: usize = 16;

/// Texture formats the host engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineFormat {
    Unknown,
    R8G8B8A8,
    L8,
    R16G16B16A16,
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Pvrtc2,
    Pvrtc4,
}

pub fn to_engine_format(format: PixelFormat) -> EngineFormat {
    match format {
        PixelFormat::Rgba8 | PixelFormat::Rgbx8 | PixelFormat::Rgb8 => EngineFormat::R8G8B8A8,
        PixelFormat::L8 => EngineFormat::L8,
        PixelFormat::Rgba16 => EngineFormat::R16G16B16A16,
        PixelFormat::Bc1 => EngineFormat::Bc1,
        PixelFormat::Bc2 => EngineFormat::Bc2,
        PixelFormat::Bc3 => EngineFormat::Bc3,
        PixelFormat::Bc4 => EngineFormat::Bc4,
        PixelFormat::Bc5 => EngineFormat::Bc5,
        PixelFormat::Pvrtc2 => EngineFormat::Pvrtc2,
        PixelFormat::Pvrtc4 => EngineFormat::Pvrtc4,
        PixelFormat::Rgb16 | PixelFormat::Rgbx16 | PixelFormat::L16 => EngineFormat::Unknown,
    }
}

/// Used for image inputs coming from the host.
pub fn from_engine_format(format: EngineFormat) -> Option<PixelFormat> {
    Some(match format {
        EngineFormat::R8G8B8A8 => PixelFormat::Rgba8,
        EngineFormat::L8 => PixelFormat::L8,
        EngineFormat::R16G16B16A16 => PixelFormat::Rgba16,
        EngineFormat::Bc1 => PixelFormat::Bc1,
        EngineFormat::Bc2 => PixelFormat::Bc2,
        EngineFormat::Bc3 => PixelFormat::Bc3,
        EngineFormat::Bc4 => PixelFormat::Bc4,
        EngineFormat::Bc5 => PixelFormat::Bc5,
        EngineFormat::Pvrtc2 => PixelFormat::Pvrtc2,
        EngineFormat::Pvrtc4 => PixelFormat::Pvrtc4,
        EngineFormat::Unknown => return None,
    })
}

/// The compressed format an output is rendered to when compression is requested. `None` keeps
/// the package format.
pub fn platform_pixel_format(profile: CompressionProfile, format: PixelFormat, channel: ChannelUse) -> Option<PixelFormat> {
    match profile {
        CompressionProfile::Mobile => None,
        CompressionProfile::Desktop => {
            if channel == ChannelUse::Normal {
                return Some(PixelFormat::Bc5);
            }

            match format {
                PixelFormat::Rgba8 | PixelFormat::Rgba16 => Some(PixelFormat::Bc3),
                PixelFormat::Rgb8 | PixelFormat::Rgb16 | PixelFormat::Rgbx8 | PixelFormat::Rgbx16 => {
                    Some(PixelFormat::Bc1)
                }
                PixelFormat::L8 | PixelFormat::L16 => Some(PixelFormat::Bc4),
                _ => None,
            }
        }
    }
}

/// Number of levels of a full mip chain down to 1x1.
pub fn calc_num_mips(mut width: u32, mut height: u32) -> u32 {
    let mut mips = 0;
    while width != 0 || height != 0 {
        width = width.max(1) >> 1;
        height = height.max(1) >> 1;
        mips += 1;
    }
    mips
}

/// Bytes occupied by `mips` levels starting at `width` x `height`.
pub fn calc_texture_size(mut width: u32, mut height: u32, mut mips: u32, format: PixelFormat) -> usize {
    let block_dim = format.block_dim() as usize;
    let bytes_per_block = block_dim * block_dim * format.bits_per_pixel() as usize / 8;

    let mut size = 0;
    while (width != 0 || height != 0) && mips != 0 {
        let w = width.max(1) as usize;
        let h = height.max(1) as usize;
        size += w.div_ceil(block_dim) * h.div_ceil(block_dim) * bytes_per_block;

        width >>= 1;
        height >>= 1;
        mips -= 1;
    }
    size
}

/// Converts BC5 blocks from unsigned to signed channels and swaps the two channel halves of
/// every block, for hosts that sample normal maps as signed BC5. Other formats are untouched.
pub fn fix_signed_normal_map(result: &mut RenderResult) {
    if result.format != PixelFormat::Bc5 {
        return;
    }

    let mut width = result.width;
    let mut height = result.height;
    let mip_count = match result.mipmap_count {
        0 => calc_num_mips(width, height),
        count => count,
    };

    let mut offset = 0;
    for _ in 0..mip_count {
        let mip_size = calc_texture_size(width, height, 1, PixelFormat::Bc5);
        let end = (offset + mip_size).min(result.data.len());

        for block in result.data[offset..end].chunks_exact_mut(BC5_BLOCK_SIZE) {
            for index in [0, 1, 8, 9] {
                block[index] = block[index].wrapping_sub(128);
            }

            let (red, green) = block.split_at_mut(BC5_BLOCK_SIZE / 2);
            red.swap_with_slice(green);
        }

        offset = end;
        width >>= 1;
        height >>= 1;
    }
}
