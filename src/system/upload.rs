use log::{debug, warn};
use procmat_descriptors::package::ChannelUse;

use crate::io::common::loader::{DeviceTextureHandle, TextureFlags, TextureLoadData};
use crate::material::TextureKey;
use crate::rendering::common::texture_format::{calc_num_mips, calc_texture_size, to_engine_format};
use crate::system::MaterialSystem;

impl MaterialSystem {
    /// Resolves a texture by its path. Unknown paths are read as sidecar descriptors, which
    /// loads the material they point to.
    pub fn texture_from_path(&mut self, path: &str) -> Option<TextureKey> {
        if let Some(texture) = self.registry.texture_from_path(path) {
            return Some(texture);
        }

        let data = self.host.read_file(path)?;
        let descriptor = match self.codec.decode_texture(&data) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                warn!("Texture descriptor {} is invalid: {}", path, err);
                return None;
            }
        };

        let material = self.get_or_load(&descriptor.material, true)?;
        let found = self.materials[material]
            .textures
            .iter()
            .copied()
            .find(|texture| self.textures[*texture].output_uid == descriptor.output_uid);

        match found {
            Some(texture) => self.registry.register_texture_path(path, texture),
            None => warn!(
                "{} refers to output {} which {} doesn't have",
                path, descriptor.output_uid, descriptor.material
            ),
        }
        found
    }

    /// Loads the pixels behind a texture path for the host. A normal map requested with
    /// [`TextureFlags::ALPHA`] hands out the gloss texture of its graph instead, or itself when
    /// the gloss has nothing to hand out.
    pub fn load_texture_data(
        &mut self,
        path: &str,
        request_flags: TextureFlags,
        device_texture: Option<DeviceTextureHandle>,
    ) -> Option<TextureLoadData> {
        let texture = self.texture_from_path(path)?;

        if request_flags.contains(TextureFlags::ALPHA) {
            if let Some(gloss) = self.gloss_texture_of(texture) {
                if let Some(load_data) = self.populate_texture_load_data(gloss, device_texture) {
                    debug!("{}: handing out the attached gloss", path);
                    return Some(load_data);
                }
                debug!("{}: attached gloss has no result, falling back to the normal map", path);
            }
        }

        self.populate_texture_load_data(texture, device_texture)
    }

    fn gloss_texture_of(&self, texture: TextureKey) -> Option<TextureKey> {
        let texture = self.textures.get(texture)?;
        let graph = self.graphs.get(texture.graph)?;
        if graph.outputs.get(texture.output_index)?.channel != ChannelUse::Normal {
            return None;
        }

        graph
            .outputs
            .iter()
            .filter(|output| output.channel == ChannelUse::Glossiness)
            .find_map(|output| output.texture())
    }

    /// Consumes the cached result of `texture` and binds `device_texture` to it, releasing the
    /// previous binding. Passing `None` unbinds. Returns `None` when the output is disabled or
    /// nothing was rendered since the last call.
    pub fn populate_texture_load_data(
        &mut self,
        texture: TextureKey,
        device_texture: Option<DeviceTextureHandle>,
    ) -> Option<TextureLoadData> {
        let target = self.textures.get(texture)?;
        let graph = self.graphs.get(target.graph)?;
        let output = graph.outputs.get(target.output_index)?;
        if !output.enabled {
            return None;
        }

        let result = self.results.take(texture)?;

        let num_mips = match result.mipmap_count {
            0 => calc_num_mips(result.width, result.height),
            count => count,
        };

        let mut flags = TextureFlags::NONE;
        match output.channel {
            ChannelUse::Normal => {
                flags |= TextureFlags::NORMAL_MAP;
                if graph.has_channel(ChannelUse::Glossiness) {
                    flags |= TextureFlags::HAS_ATTACHED_ALPHA | TextureFlags::SPLITTED;
                }
            }
            ChannelUse::Diffuse | ChannelUse::BaseColor | ChannelUse::Specular => flags |= TextureFlags::SRGB_READ,
            ChannelUse::Glossiness => flags |= TextureFlags::SPLITTED,
            _ => {}
        }

        let size = calc_texture_size(result.width, result.height, num_mips, result.format);
        let mut data = result.data;
        if data.len() < size {
            warn!("{}: result holds {} bytes, expected {}", target.path, data.len(), size);
        }
        data.truncate(size);

        let load_data = TextureLoadData {
            width: result.width,
            height: result.height,
            num_mips,
            format: to_engine_format(result.format),
            flags,
            data,
        };

        if let Some(device_texture) = device_texture {
            self.host.add_ref_device_texture(device_texture);
        }
        if let Some(previous) = std::mem::replace(&mut self.textures[texture].device_texture, device_texture) {
            self.host.release_device_texture(previous);
        }

        Some(load_data)
    }
}
