use log::{debug, error, info, warn};
use procmat_descriptors::PackageError;
use procmat_descriptors::material::{MaterialDescriptor, OutputInfoDesc, ParameterDesc};
use procmat_descriptors::package::{ChannelUse, PackageDesc};
use procmat_descriptors::texture::TextureDescriptor;

use crate::MaterialError;
use crate::material::graph::{GraphInput, GraphInstance, GraphOutput};
use crate::material::texture::{ProceduralTexture, texture_path};
use crate::material::{GraphKey, MaterialKey, ProceduralMaterial, TextureKey};
use crate::rendering::backend::RenderMode;
use crate::system::MaterialSystem;
use crate::util::normalize_path;

pub(crate) fn instantiate_graphs(material: MaterialKey, package: &PackageDesc) -> Result<Vec<GraphInstance>, PackageError> {
    package
        .graphs
        .iter()
        .enumerate()
        .map(|(index, desc)| {
            let index = u16::try_from(index).map_err(|_| PackageError::Malformed {
                reason: format!("graph {} exceeds the addressable range", index),
            })?;
            GraphInstance::from_desc(material, index, desc)
        })
        .collect()
}

impl MaterialSystem {
    /// The registered material at `path`. Unless `force_load` is set, nothing is loaded.
    pub fn get_or_load(&mut self, path: &str, force_load: bool) -> Option<MaterialKey> {
        let path = normalize_path(path);
        if let Some(material) = self.registry.find_by_path(&path) {
            return Some(material);
        }

        if !force_load {
            return None;
        }

        match self.load(&path) {
            Ok(material) => Some(material),
            Err(err) => {
                error!("Failed to load {}: {}", path, err);
                None
            }
        }
    }

    /// Loads the material descriptor at `path` with the package it refers to, registers the
    /// material and renders it once.
    pub fn load(&mut self, path: &str) -> Result<MaterialKey, MaterialError> {
        let path = normalize_path(path);
        if let Some(material) = self.registry.find_by_path(&path) {
            return Ok(material);
        }

        let descriptor = self.read_material_descriptor(&path)?;
        let source = normalize_path(&descriptor.source);
        let package = self.read_package(&source)?;

        let material = self
            .materials
            .insert(ProceduralMaterial::new(&path, &source, package));

        let instances = match instantiate_graphs(material, &self.materials[material].package) {
            Ok(instances) => instances,
            Err(err) => {
                self.materials.remove(material);
                return Err(MaterialError::Package { path: source, source: err });
            }
        };

        if self
            .registry
            .register(material, &mut self.materials[material])
            .is_none()
        {
            self.materials.remove(material);
            return Err(MaterialError::Registration { path });
        }

        self.attach_graphs(material, instances);
        self.apply_parameters(material, &descriptor.parameters);
        self.apply_output_settings(material, &descriptor.outputs);

        let owner = &self.materials[material];
        info!(
            "Loaded {} as {} ({} graph(s), {} texture(s))",
            path,
            owner.id,
            owner.graphs.len(),
            owner.textures.len()
        );

        self.queue_render_material(material);
        self.render_sync_with(RenderMode::SkipReloadTextures);
        Ok(material)
    }

    pub(crate) fn read_material_descriptor(&self, path: &str) -> Result<MaterialDescriptor, MaterialError> {
        let data = self
            .host
            .read_file(path)
            .ok_or_else(|| MaterialError::ReadFailed { path: path.to_string() })?;

        self.codec
            .decode_material(&data)
            .map_err(|source| MaterialError::Descriptor {
                path: path.to_string(),
                source,
            })
    }

    pub(crate) fn read_package(&self, source: &str) -> Result<PackageDesc, MaterialError> {
        let data = self
            .host
            .read_file(source)
            .ok_or_else(|| MaterialError::ReadFailed {
                path: source.to_string(),
            })?;

        self.renderer
            .load_package(&data)
            .map_err(|err| MaterialError::Package {
                path: source.to_string(),
                source: err,
            })
    }

    /// Inserts the graphs of `material` with one texture per output, and an editor preview per
    /// output in editor mode.
    pub(crate) fn attach_graphs(&mut self, material: MaterialKey, instances: Vec<GraphInstance>) {
        let owner = &self.materials[material];
        let graph_count = instances.len();
        let mut graph_keys = Vec::with_capacity(graph_count);
        let mut texture_keys = Vec::with_capacity(owner.package.output_count());

        for (instance, desc) in instances.into_iter().zip(&owner.package.graphs) {
            let has_gloss = desc.has_channel(ChannelUse::Glossiness);
            let graph = self.graphs.insert(instance);

            for (output_index, output) in desc.outputs.iter().enumerate() {
                let path = texture_path(&owner.path, graph_count, &desc.label, output.channel, has_gloss);
                let texture = self.textures.insert(ProceduralTexture {
                    path: path.clone(),
                    graph,
                    output_index,
                    output_uid: output.uid,
                    device_texture: None,
                    preview: None,
                });

                self.registry.register_texture_path(&path, texture);
                self.graphs[graph]
                    .outputs
                    .push(GraphOutput::new_static(output, texture));
                texture_keys.push(texture);
            }

            if self.config.editor_mode {
                for output in &desc.outputs {
                    self.graphs[graph].outputs.push(GraphOutput::new_preview(output));
                }
            }

            graph_keys.push(graph);
        }

        let owner = &mut self.materials[material];
        owner.graphs = graph_keys;
        owner.textures = texture_keys;
    }

    /// Applies persisted input values. Unknown graphs and inputs are skipped.
    pub(crate) fn apply_parameters(&mut self, material: MaterialKey, parameters: &[ParameterDesc]) {
        let Some(owner) = self.materials.get(material) else {
            return;
        };
        let path = owner.path.clone();
        let graphs = owner.graphs.clone();

        for parameter in parameters {
            let graph = usize::try_from(parameter.graph_index)
                .ok()
                .and_then(|index| graphs.get(index).copied());
            let Some(graph) = graph else {
                warn!(
                    "{}: skipping {}, there is no graph {}",
                    path, parameter.name, parameter.graph_index
                );
                continue;
            };

            let applied = self
                .graph_mut(graph)
                .is_some_and(|mut view| view.set_value_text(&parameter.name, &parameter.value));
            if !applied {
                warn!(
                    "{}: skipping {} = \"{}\" of graph {}",
                    path, parameter.name, parameter.value, parameter.graph_index
                );
            }
        }
    }

    pub(crate) fn apply_output_settings(&mut self, material: MaterialKey, settings: &[OutputInfoDesc]) {
        let Some(owner) = self.materials.get(material) else {
            return;
        };
        let path = owner.path.clone();
        let graphs = owner.graphs.clone();

        for settings in settings {
            let applied = graphs.iter().any(|graph| {
                self.graph_mut(*graph)
                    .is_some_and(|mut view| view.set_output_settings(settings))
            });
            if !applied {
                warn!("{}: skipping settings of unknown output {}", path, settings.uid);
            }
        }
    }

    /// The descriptor `save` writes: non-default inputs and the settings of every static output.
    pub fn material_descriptor(&self, material: MaterialKey) -> Option<MaterialDescriptor> {
        let owner = self.materials.get(material)?;
        let mut descriptor = MaterialDescriptor {
            source: owner.source.clone(),
            ..Default::default()
        };

        for (index, graph) in owner.graphs.iter().enumerate() {
            let Some(instance) = self.graphs.get(*graph) else {
                continue;
            };

            descriptor.parameters.extend(
                instance
                    .inputs
                    .iter()
                    .filter(|input| !input.is_default())
                    .map(|input| ParameterDesc {
                        graph_index: index as i32,
                        name: input.identifier.clone(),
                        value: input.value.to_string(),
                    }),
            );

            descriptor.outputs.extend(
                instance
                    .outputs
                    .iter()
                    .filter(|output| output.is_static())
                    .map(|output| output.settings()),
            );
        }

        Some(descriptor)
    }

    /// Writes the material descriptor to `path` and a sidecar for every texture. False when any
    /// write failed.
    pub fn save(&self, material: MaterialKey, path: &str) -> bool {
        let Some(descriptor) = self.material_descriptor(material) else {
            return false;
        };

        let data = match self.codec.encode_material(&descriptor) {
            Ok(data) => data,
            Err(err) => {
                error!("Failed to encode {}: {}", path, err);
                return false;
            }
        };

        let mut saved = self.host.write_file(path, &data);
        if !saved {
            error!("Failed to write {}", path);
        }

        for texture in &self.materials[material].textures {
            let texture = &self.textures[*texture];
            let sidecar = TextureDescriptor {
                material: path.to_string(),
                output_uid: texture.output_uid,
            };

            match self.codec.encode_texture(&sidecar) {
                Ok(data) if self.host.write_file(&texture.path, &data) => {}
                Ok(_) => {
                    error!("Failed to write {}", texture.path);
                    saved = false;
                }
                Err(err) => {
                    error!("Failed to encode {}: {}", texture.path, err);
                    saved = false;
                }
            }
        }

        saved
    }

    /// Unregisters and disposes `material`. Batches already submitted for it keep running, their
    /// outputs are dropped when they arrive.
    pub fn remove(&mut self, material: MaterialKey) -> bool {
        let Some(owner) = self.materials.get(material) else {
            return false;
        };

        self.registry.unregister(owner);
        let graphs = owner.graphs.clone();
        let textures = owner.textures.clone();
        self.dispose(&graphs, &textures);

        if let Some(owner) = self.materials.remove(material) {
            debug!("Removed {}", owner.path);
        }
        true
    }

    /// Drops graphs and textures along with every reference the system holds to them.
    pub(crate) fn dispose(&mut self, graphs: &[GraphKey], textures: &[TextureKey]) {
        self.scheduler.purge_graphs(graphs);
        self.pending_images
            .retain(|(graph, _), _| !graphs.contains(graph));

        for texture in textures {
            self.results.purge(*texture);
            self.uploads.retain(|upload| upload != texture);

            if let Some(removed) = self.textures.remove(*texture) {
                self.registry.unregister_texture(*texture);
                if let Some(device_texture) = removed.device_texture {
                    self.host.release_device_texture(device_texture);
                }
            }
        }

        for graph in graphs {
            self.graphs.remove(*graph);
        }
    }

    /// Resets every material to its persisted state, once per call.
    pub fn reset_all(&mut self) {
        self.reset_generation = self.reset_generation.wrapping_add(1);
        let materials: Vec<MaterialKey> = self.materials.keys().collect();
        for material in materials {
            self.reset(material);
        }
    }

    fn reset(&mut self, material: MaterialKey) {
        let generation = self.reset_generation;
        let Some(owner) = self.materials.get_mut(material) else {
            return;
        };
        if owner.last_reset_generation == generation {
            return;
        }

        owner.last_reset_generation = generation;
        owner.image_inputs.clear();
        let path = owner.path.clone();
        let graphs = owner.graphs.clone();

        for graph in &graphs {
            if let Some(instance) = self.graphs.get_mut(*graph) {
                instance.inputs.iter_mut().for_each(GraphInput::reset);
                instance.mark_dirty();
            }
        }

        match self.read_material_descriptor(&path) {
            Ok(descriptor) => self.apply_parameters(material, &descriptor.parameters),
            Err(err) => warn!("Resetting {} to defaults: {}", path, err),
        }

        self.queue_render_material(material);
        self.render_sync();
    }
}
