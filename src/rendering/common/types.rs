use std::fmt::{Debug, Formatter};

use procmat_descriptors::format::PixelFormat;

use crate::io::common::loader::TextureLoadData;
use crate::material::GraphKey;
use crate::material::value::GraphValue;
use crate::util::ids::GraphInstanceId;

/// The pixels of one computed output, all mip levels back to back.
#[derive(Clone, PartialEq)]
pub struct RenderResult {
    pub width: u32,
    pub height: u32,
    /// 0 means the full chain.
    pub mipmap_count: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl Debug for RenderResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ {}x{} {:?}, ", self.width, self.height, self.format)?;
        write!(f, "mipmap_count: {}, ", self.mipmap_count)?;
        write!(f, "data: [{}] }}", self.data.len())
    }
}

/// Snapshot of a graph instance as pushed to the renderer. `graph` is echoed back with every
/// computed output and resolved again on the owning thread.
#[derive(Debug, Clone)]
pub struct GraphJob {
    pub graph: GraphKey,
    pub instance: GraphInstanceId,
    pub label: String,
    pub inputs: Vec<InputJob>,
    pub outputs: Vec<OutputJob>,
}

#[derive(Debug, Clone)]
pub struct InputJob {
    pub uid: u32,
    pub identifier: String,
    pub value: GraphValue,
    /// Pixels of a bound image input, resolved right before the push.
    pub image: Option<TextureLoadData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputJob {
    /// Index of the output within its graph instance.
    pub index: usize,
    pub uid: u32,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub mipmaps: u32,
}
