//! Per graph facades over the arenas of the `MaterialSystem`.
//!
//! Views borrow the system, so they are meant to be short lived: resolve a `GraphKey` or a
//! `GraphInstanceId`, read or edit, drop. Edits mark the affected outputs dirty but don't queue
//! anything, queueing is up to the caller.
use procmat_descriptors::format::PixelFormat;
use procmat_descriptors::material::OutputInfoDesc;
use procmat_descriptors::package::{ChannelUse, InputType, InputWidget};
use slotmap::SlotMap;

use crate::material::graph::{GraphInput, GraphInstance, GraphOutput, OutputKind};
use crate::material::texture::ProceduralTexture;
use crate::material::value::GraphValue;
use crate::material::{GraphKey, ProceduralMaterial, TextureKey};
use crate::settings::CompressionProfile;
use crate::util::ids::GraphInstanceId;

pub struct GraphView<'a> {
    pub(crate) key: GraphKey,
    pub(crate) graph: &'a GraphInstance,
    pub(crate) material: &'a ProceduralMaterial,
    pub(crate) textures: &'a SlotMap<TextureKey, ProceduralTexture>,
}

impl<'a> GraphView<'a> {
    pub fn key(&self) -> GraphKey {
        self.key
    }

    pub fn id(&self) -> GraphInstanceId {
        GraphInstanceId::encode(self.material.id, self.graph.index)
    }

    pub fn index(&self) -> u16 {
        self.graph.index
    }

    pub fn label(&self) -> &'a str {
        &self.graph.label
    }

    pub fn url(&self) -> &'a str {
        &self.graph.url
    }

    pub fn material_path(&self) -> &'a str {
        &self.material.path
    }

    pub fn inputs(&self) -> impl Iterator<Item = InputView<'a>> + '_ {
        self.graph.inputs.iter().map(|input| self.input_view(input))
    }

    pub fn input(&self, identifier: &str) -> Option<InputView<'a>> {
        self.graph
            .input_index(identifier)
            .map(|index| self.input_view(&self.graph.inputs[index]))
    }

    fn input_view(&self, input: &'a GraphInput) -> InputView<'a> {
        InputView {
            input,
            image: self.material.image_input(self.key, input.uid),
        }
    }

    pub fn outputs(&self) -> impl Iterator<Item = OutputView<'a>> + '_ {
        self.graph.outputs.iter().map(|output| self.output_view(output))
    }

    /// The static output with `uid`.
    pub fn output(&self, uid: u32) -> Option<OutputView<'a>> {
        self.graph
            .output_index_by_uid(uid)
            .map(|index| self.output_view(&self.graph.outputs[index]))
    }

    fn output_view(&self, output: &'a GraphOutput) -> OutputView<'a> {
        OutputView {
            output,
            texture: output.texture().and_then(|key| self.textures.get(key)),
        }
    }
}

pub struct InputView<'a> {
    input: &'a GraphInput,
    image: Option<&'a str>,
}

impl<'a> InputView<'a> {
    pub fn uid(&self) -> u32 {
        self.input.uid
    }

    pub fn identifier(&self) -> &'a str {
        &self.input.identifier
    }

    pub fn label(&self) -> &'a str {
        &self.input.label
    }

    pub fn group(&self) -> &'a str {
        &self.input.group
    }

    pub fn description(&self) -> &'a str {
        &self.input.description
    }

    pub fn widget(&self) -> InputWidget {
        self.input.widget
    }

    pub fn input_type(&self) -> InputType {
        self.input.input_type()
    }

    pub fn value(&self) -> &'a GraphValue {
        &self.input.value
    }

    pub fn default_value(&self) -> &'a GraphValue {
        &self.input.default
    }

    pub fn min(&self) -> Option<&'a GraphValue> {
        self.input.min.as_ref()
    }

    pub fn max(&self) -> Option<&'a GraphValue> {
        self.input.max.as_ref()
    }

    pub fn enum_values(&self) -> &'a [(GraphValue, String)] {
        &self.input.enum_values
    }

    pub fn is_default(&self) -> bool {
        self.input.is_default()
    }

    /// Path of the bound image, image inputs only.
    pub fn image_path(&self) -> Option<&'a str> {
        self.image
    }
}

pub struct OutputView<'a> {
    output: &'a GraphOutput,
    texture: Option<&'a ProceduralTexture>,
}

impl<'a> OutputView<'a> {
    pub fn uid(&self) -> u32 {
        self.output.uid
    }

    pub fn identifier(&self) -> &'a str {
        &self.output.identifier
    }

    pub fn label(&self) -> &'a str {
        &self.output.label
    }

    pub fn channel(&self) -> ChannelUse {
        self.output.channel
    }

    pub fn kind(&self) -> OutputKind {
        self.output.kind
    }

    /// The format the output is rendered to, after overrides and compression.
    pub fn format(&self) -> PixelFormat {
        self.output.format
    }

    pub fn package_format(&self) -> PixelFormat {
        self.output.package_format
    }

    pub fn size(&self) -> (u32, u32) {
        (self.output.width, self.output.height)
    }

    pub fn mipmaps(&self) -> u32 {
        self.output.mipmaps
    }

    pub fn is_enabled(&self) -> bool {
        self.output.enabled
    }

    pub fn is_dirty(&self) -> bool {
        self.output.dirty
    }

    pub fn settings(&self) -> OutputInfoDesc {
        self.output.settings()
    }

    /// Path of the backing texture, static outputs only.
    pub fn path(&self) -> Option<&'a str> {
        self.texture.map(|texture| texture.path.as_str())
    }

    pub fn texture(&self) -> Option<TextureKey> {
        self.output.texture()
    }
}

pub struct GraphViewMut<'a> {
    pub(crate) key: GraphKey,
    pub(crate) graph: &'a mut GraphInstance,
    pub(crate) material: &'a mut ProceduralMaterial,
    pub(crate) profile: CompressionProfile,
}

impl GraphViewMut<'_> {
    pub fn key(&self) -> GraphKey {
        self.key
    }

    /// Returns false when there is no such input or the value has another type.
    pub fn set_value(&mut self, identifier: &str, value: GraphValue) -> bool {
        let Some(index) = self.graph.input_index(identifier) else {
            return false;
        };

        let input = &mut self.graph.inputs[index];
        if input.value == value {
            return true;
        }

        if !input.set(value) {
            return false;
        }

        if let GraphValue::Image(path) = &input.value {
            let binding = (self.key, input.uid);
            if path.is_empty() {
                self.material.image_inputs.remove(&binding);
            } else {
                self.material.image_inputs.insert(binding, path.clone());
            }
        }

        self.graph.mark_dirty();
        true
    }

    /// Parses `text` in the descriptor form, see [`GraphValue::parse`].
    pub fn set_value_text(&mut self, identifier: &str, text: &str) -> bool {
        let Some(index) = self.graph.input_index(identifier) else {
            return false;
        };

        match GraphValue::parse(self.graph.inputs[index].input_type(), text) {
            Some(value) => self.set_value(identifier, value),
            None => false,
        }
    }

    pub fn bind_image(&mut self, identifier: &str, path: &str) -> bool {
        self.set_value(identifier, GraphValue::Image(path.to_string()))
    }

    pub fn reset_input(&mut self, identifier: &str) -> bool {
        let Some(index) = self.graph.input_index(identifier) else {
            return false;
        };

        let default = self.graph.inputs[index].default.clone();
        self.set_value(identifier, default)
    }

    /// Applies persisted settings to the static output `settings.uid`.
    pub fn set_output_settings(&mut self, settings: &OutputInfoDesc) -> bool {
        let Some(index) = self.graph.output_index_by_uid(settings.uid) else {
            return false;
        };

        let Some(desc) = self
            .material
            .package
            .graphs
            .get(self.graph.index as usize)
            .and_then(|graph| graph.outputs.iter().find(|output| output.uid == settings.uid))
        else {
            return false;
        };

        let output = &mut self.graph.outputs[index];
        output.apply_settings(desc, settings, self.profile);
        output.dirty = true;
        true
    }

    pub fn set_output_enabled(&mut self, uid: u32, enabled: bool) -> bool {
        let Some(index) = self.graph.output_index_by_uid(uid) else {
            return false;
        };

        let output = &mut self.graph.outputs[index];
        if output.enabled != enabled {
            output.enabled = enabled;
            output.dirty = true;
        }
        true
    }
}
