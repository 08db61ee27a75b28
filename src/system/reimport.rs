use std::collections::BTreeMap;

use log::{debug, error, info, warn};
use procmat_descriptors::material::OutputInfoDesc;

use crate::MaterialError;
use crate::io::common::loader::DeviceTextureHandle;
use crate::material::MaterialKey;
use crate::material::value::GraphValue;
use crate::system::MaterialSystem;
use crate::system::lifecycle::instantiate_graphs;

/// What survives a reimport, keyed by uids since those are stable across package revisions.
#[derive(Debug, Default)]
struct Customizations {
    /// Non-default inputs, by graph index and input uid.
    inputs: BTreeMap<(usize, u32), GraphValue>,
    /// Settings of static outputs, by output uid.
    outputs: BTreeMap<u32, OutputInfoDesc>,
    /// Device textures taken from the old textures, by output uid.
    device_textures: BTreeMap<u32, DeviceTextureHandle>,
}

impl MaterialSystem {
    /// Rebuilds `material` from its (possibly changed) package, keeping the customized inputs,
    /// the output settings and the bound device textures. The material keeps its path and id,
    /// graph and texture keys change.
    ///
    /// The package is read and validated first: on failure nothing is touched.
    pub fn reimport(&mut self, material: MaterialKey) -> Result<(), MaterialError> {
        self.render_fence();

        let owner = self
            .materials
            .get(material)
            .ok_or(MaterialError::UnknownMaterial)?;
        let path = owner.path.clone();
        let source = owner.source.clone();

        let package = self.read_package(&source).inspect_err(|err| {
            error!("Reimport of {} failed, keeping the current state: {}", path, err);
        })?;
        let instances = instantiate_graphs(material, &package)
            .map_err(|err| MaterialError::Package {
                path: source.clone(),
                source: err,
            })
            .inspect_err(|err| {
                error!("Reimport of {} failed, keeping the current state: {}", path, err);
            })?;

        let mut kept = self.capture_customizations(material);

        let owner = &self.materials[material];
        let graphs = owner.graphs.clone();
        let textures = owner.textures.clone();
        for texture in &textures {
            let texture = &self.textures[*texture];
            if !self.host.remove_file(&texture.path) {
                debug!("No sidecar to remove at {}", texture.path);
            }
        }
        if !self.host.remove_file(&path) {
            warn!("Failed to remove {} before rewriting it", path);
        }

        self.dispose(&graphs, &textures);
        let owner = &mut self.materials[material];
        owner.graphs.clear();
        owner.textures.clear();
        owner.image_inputs.clear();
        owner.package = package;

        self.attach_graphs(material, instances);
        let settings: Vec<OutputInfoDesc> = kept.outputs.values().cloned().collect();
        self.apply_output_settings(material, &settings);

        for texture in self.materials[material].textures.clone() {
            let texture = &mut self.textures[texture];
            if let Some(device_texture) = kept.device_textures.remove(&texture.output_uid) {
                texture.device_texture = Some(device_texture);
            }
        }

        let graphs = self.materials[material].graphs.clone();
        for ((index, uid), value) in kept.inputs {
            let Some(graph) = graphs.get(index) else {
                debug!("{}: graph {} is gone, dropping input {}", path, index, uid);
                continue;
            };

            let identifier = self.graphs[*graph]
                .input_index_by_uid(uid)
                .map(|input| self.graphs[*graph].inputs[input].identifier.clone());
            let applied = match identifier {
                Some(identifier) => self
                    .graph_mut(*graph)
                    .is_some_and(|mut view| view.set_value(&identifier, value)),
                None => false,
            };
            if !applied {
                debug!("{}: input {} of graph {} didn't survive", path, uid, index);
            }
        }

        if !self.save(material, &path) {
            error!("Failed to save {} after reimporting it", path);
        }

        for device_texture in kept.device_textures.into_values() {
            self.host.release_device_texture(device_texture);
        }

        info!("Reimported {}", path);
        self.queue_render_material(material);
        self.render_sync();
        Ok(())
    }

    fn capture_customizations(&mut self, material: MaterialKey) -> Customizations {
        let mut kept = Customizations::default();
        let owner = &self.materials[material];

        for (index, graph) in owner.graphs.iter().enumerate() {
            let Some(instance) = self.graphs.get(*graph) else {
                continue;
            };

            for input in instance.inputs.iter().filter(|input| !input.is_default()) {
                kept.inputs.insert((index, input.uid), input.value.clone());
            }

            for output in instance.outputs.iter().filter(|output| output.is_static()) {
                kept.outputs.insert(output.uid, output.settings());
            }
        }

        for texture in &owner.textures {
            let Some(texture) = self.textures.get_mut(*texture) else {
                continue;
            };
            if let Some(device_texture) = texture.device_texture.take() {
                kept.device_textures.insert(texture.output_uid, device_texture);
            }
        }

        kept
    }
}
