use procmat_descriptors::package::ChannelUse;

use crate::io::common::loader::DeviceTextureHandle;
use crate::material::GraphKey;
use crate::rendering::common::types::RenderResult;
use crate::util::split_path;

pub const TEXTURE_EXTENSION: &str = "sub";

/// The texture backing a static output. Engines address it by its path.
#[derive(Debug)]
pub struct ProceduralTexture {
    pub(crate) path: String,
    pub(crate) graph: GraphKey,
    pub(crate) output_index: usize,
    pub(crate) output_uid: u32,
    pub(crate) device_texture: Option<DeviceTextureHandle>,
    /// Latest editor preview, see `OutputKind::Dynamic`.
    pub(crate) preview: Option<RenderResult>,
}

impl ProceduralTexture {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn graph(&self) -> GraphKey {
        self.graph
    }

    pub fn output_uid(&self) -> u32 {
        self.output_uid
    }

    pub fn device_texture(&self) -> Option<DeviceTextureHandle> {
        self.device_texture
    }

    pub fn preview(&self) -> Option<&RenderResult> {
        self.preview.as_ref()
    }
}

fn channel_suffix(channel: ChannelUse, graph_has_gloss: bool) -> &'static str {
    match channel {
        ChannelUse::Diffuse | ChannelUse::BaseColor => "_diff",
        ChannelUse::Specular => "_spec",
        ChannelUse::Height => "_displ",
        ChannelUse::Glossiness => "_gloss",
        ChannelUse::Normal if graph_has_gloss => "_ddna",
        ChannelUse::Normal => "_ddn",
        _ => "_unknown",
    }
}

/// `<dir>/<material stem>[_<graph label>]<channel suffix>.sub`. The graph label is only part of
/// the name when the material has more than one graph.
pub fn texture_path(
    material_path: &str,
    graph_count: usize,
    graph_label: &str,
    channel: ChannelUse,
    graph_has_gloss: bool,
) -> String {
    let (directory, stem) = split_path(material_path);
    let mut path = format!("{}{}", directory, stem);

    if graph_count > 1 {
        path.push('_');
        path.push_str(&graph_label.to_lowercase());
    }

    path.push_str(channel_suffix(channel, graph_has_gloss));
    path.push('.');
    path.push_str(TEXTURE_EXTENSION);
    path
}
