use procmat_descriptors::PackageError;
use procmat_descriptors::format::PixelFormat;
use procmat_descriptors::material::{OutputFormatOverride, OutputInfoDesc};
use procmat_descriptors::package::{ChannelUse, GraphDesc, InputDesc, InputType, InputWidget, OutputDesc};

use crate::material::value::GraphValue;
use crate::material::{GraphKey, MaterialKey, TextureKey};
use crate::rendering::common::texture_format::platform_pixel_format;
use crate::rendering::common::types::{GraphJob, InputJob, OutputJob};
use crate::settings::CompressionProfile;
use crate::util::ids::GraphInstanceId;

#[derive(Debug, Clone)]
pub struct GraphInput {
    pub(crate) uid: u32,
    pub(crate) identifier: String,
    pub(crate) label: String,
    pub(crate) group: String,
    pub(crate) description: String,
    pub(crate) widget: InputWidget,
    pub(crate) default: GraphValue,
    pub(crate) value: GraphValue,
    pub(crate) min: Option<GraphValue>,
    pub(crate) max: Option<GraphValue>,
    pub(crate) enum_values: Vec<(GraphValue, String)>,
}

fn parse_value(graph: &str, desc: &InputDesc, what: &'static str, text: &str) -> Result<GraphValue, PackageError> {
    GraphValue::parse(desc.input_type, text).ok_or_else(|| PackageError::InvalidValue {
        graph: graph.to_string(),
        identifier: desc.identifier.clone(),
        what,
        value: text.to_string(),
    })
}

impl GraphInput {
    pub fn from_desc(graph: &str, desc: &InputDesc) -> Result<Self, PackageError> {
        let default = parse_value(graph, desc, "default", &desc.default)?;
        let min = desc
            .min
            .as_deref()
            .map(|text| parse_value(graph, desc, "min", text))
            .transpose()?;
        let max = desc
            .max
            .as_deref()
            .map(|text| parse_value(graph, desc, "max", text))
            .transpose()?;
        let enum_values = desc
            .enum_values
            .iter()
            .map(|entry| Ok((parse_value(graph, desc, "enum", &entry.value)?, entry.label.clone())))
            .collect::<Result<Vec<_>, PackageError>>()?;

        Ok(Self {
            uid: desc.uid,
            identifier: desc.identifier.clone(),
            label: desc.label.clone(),
            group: desc.group.clone(),
            description: desc.description.clone(),
            widget: desc.widget,
            value: default.clone(),
            default,
            min,
            max,
            enum_values,
        })
    }

    pub fn input_type(&self) -> InputType {
        self.default.input_type()
    }

    pub fn is_default(&self) -> bool {
        self.value == self.default
    }

    /// Returns false when the value is of another type.
    pub fn set(&mut self, value: GraphValue) -> bool {
        if value.input_type() != self.input_type() {
            return false;
        }
        self.value = value;
        true
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }
}

/// What backs an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Static(TextureKey),
    /// Editor preview. Never cached nor persisted.
    Dynamic(PreviewSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewSlot {
    /// Uid of the static output this preview mirrors.
    pub mirrors: u32,
}

#[derive(Debug, Clone)]
pub struct GraphOutput {
    pub(crate) uid: u32,
    pub(crate) identifier: String,
    pub(crate) label: String,
    pub(crate) channel: ChannelUse,
    pub(crate) package_format: PixelFormat,
    pub(crate) format: PixelFormat,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) mipmaps: u32,
    pub(crate) compressed: bool,
    pub(crate) format_override: Option<OutputFormatOverride>,
    pub(crate) enabled: bool,
    pub(crate) dirty: bool,
    pub(crate) kind: OutputKind,
}

impl GraphOutput {
    pub fn new_static(desc: &OutputDesc, texture: TextureKey) -> Self {
        Self {
            uid: desc.uid,
            identifier: desc.identifier.clone(),
            label: desc.label.clone(),
            channel: desc.channel,
            package_format: desc.format,
            format: desc.format,
            width: desc.width,
            height: desc.height,
            mipmaps: desc.mipmaps,
            compressed: false,
            format_override: None,
            enabled: true,
            dirty: true,
            kind: OutputKind::Static(texture),
        }
    }

    /// A preview keeps the size of its output, drops the mips and is either luminance or RGBA.
    pub fn new_preview(desc: &OutputDesc) -> Self {
        let format = if desc.format.is_luminance() || desc.format == PixelFormat::Bc4 {
            PixelFormat::L8
        } else {
            PixelFormat::Rgba8
        };

        Self {
            uid: desc.uid,
            identifier: desc.identifier.clone(),
            label: "Editor Preview".to_string(),
            channel: ChannelUse::Unknown,
            package_format: format,
            format,
            width: desc.width,
            height: desc.height,
            mipmaps: 1,
            compressed: false,
            format_override: None,
            enabled: true,
            dirty: true,
            kind: OutputKind::Dynamic(PreviewSlot { mirrors: desc.uid }),
        }
    }

    /// Applies persisted settings. The effective format starts from the package, takes the
    /// override and is finally replaced by the platform's compressed format when requested.
    pub fn apply_settings(&mut self, desc: &OutputDesc, settings: &OutputInfoDesc, profile: CompressionProfile) {
        let overridden = settings.format_override.unwrap_or_default();

        self.enabled = settings.enabled;
        self.compressed = settings.compressed;
        self.format_override = settings.format_override.filter(|format| !format.is_default());
        self.format = overridden.format.unwrap_or(desc.format);
        self.width = overridden.width.unwrap_or(desc.width);
        self.height = overridden.height.unwrap_or(desc.height);
        self.mipmaps = overridden.mipmaps.unwrap_or(desc.mipmaps);

        if settings.compressed {
            if let Some(format) = platform_pixel_format(profile, desc.format, desc.channel) {
                self.format = format;
            }
        }
    }

    pub fn settings(&self) -> OutputInfoDesc {
        OutputInfoDesc {
            uid: self.uid,
            enabled: self.enabled,
            compressed: self.compressed,
            format_override: self.format_override,
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self.kind, OutputKind::Static(_))
    }

    pub fn texture(&self) -> Option<TextureKey> {
        match self.kind {
            OutputKind::Static(texture) => Some(texture),
            OutputKind::Dynamic(_) => None,
        }
    }

    fn job(&self, index: usize) -> OutputJob {
        OutputJob {
            index,
            uid: self.uid,
            format: self.format,
            width: self.width,
            height: self.height,
            mipmaps: self.mipmaps,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphInstance {
    pub(crate) material: MaterialKey,
    pub(crate) index: u16,
    pub(crate) label: String,
    pub(crate) url: String,
    pub(crate) inputs: Vec<GraphInput>,
    pub(crate) outputs: Vec<GraphOutput>,
}

impl GraphInstance {
    /// Builds the inputs of a graph. Outputs are added by the caller since static outputs need
    /// their texture first.
    pub fn from_desc(material: MaterialKey, index: u16, desc: &GraphDesc) -> Result<Self, PackageError> {
        let inputs = desc
            .inputs
            .iter()
            .map(|input| GraphInput::from_desc(&desc.label, input))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            material,
            index,
            label: desc.label.clone(),
            url: desc.url.clone(),
            inputs,
            outputs: Vec::with_capacity(desc.outputs.len()),
        })
    }

    pub fn input_index(&self, identifier: &str) -> Option<usize> {
        self.inputs.iter().position(|input| input.identifier == identifier)
    }

    pub fn input_index_by_uid(&self, uid: u32) -> Option<usize> {
        self.inputs.iter().position(|input| input.uid == uid)
    }

    /// Only static outputs, previews share the uid of the output they mirror.
    pub fn output_index_by_uid(&self, uid: u32) -> Option<usize> {
        self.outputs
            .iter()
            .position(|output| output.uid == uid && output.is_static())
    }

    pub fn has_channel(&self, channel: ChannelUse) -> bool {
        self.outputs
            .iter()
            .any(|output| output.is_static() && output.channel == channel)
    }

    pub fn mark_dirty(&mut self) {
        self.outputs.iter_mut().for_each(|output| output.dirty = true);
    }

    pub fn is_dirty(&self) -> bool {
        self.outputs.iter().any(|output| output.enabled && output.dirty)
    }

    /// Snapshots the graph for the renderer. Every enabled dirty output is included and
    /// considered clean from now on.
    pub fn build_job(&mut self, key: GraphKey, instance: GraphInstanceId) -> GraphJob {
        let mut outputs = Vec::new();
        for (index, output) in self.outputs.iter_mut().enumerate() {
            if output.enabled && output.dirty {
                output.dirty = false;
                outputs.push(output.job(index));
            }
        }

        GraphJob {
            graph: key,
            instance,
            label: self.label.clone(),
            inputs: self
                .inputs
                .iter()
                .map(|input| InputJob {
                    uid: input.uid,
                    identifier: input.identifier.clone(),
                    value: input.value.clone(),
                    image: None,
                })
                .collect(),
            outputs,
        }
    }
}
