use std::collections::HashSet;

use log::warn;
use serde_derive::{Deserialize, Serialize};

use crate::format::PixelFormat;
use crate::PackageError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename = "Package")]
pub struct PackageDesc {
    #[serde(rename = "Graph", default)]
    pub graphs: Vec<GraphDesc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GraphDesc {
    #[serde(rename = "@label")]
    pub label: String,
    #[serde(rename = "@url", default)]
    pub url: String,
    #[serde(rename = "Input", default)]
    pub inputs: Vec<InputDesc>,
    #[serde(rename = "Output", default)]
    pub outputs: Vec<OutputDesc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    Float1,
    Float2,
    Float3,
    Float4,
    Integer1,
    Integer2,
    Integer3,
    Integer4,
    Image,
    String,
}

impl InputType {
    pub fn is_numeric(self) -> bool {
        !matches!(self, InputType::Image | InputType::String)
    }

    /// Number of components of numeric types, 0 otherwise.
    pub fn dimension(self) -> usize {
        match self {
            InputType::Float1 | InputType::Integer1 => 1,
            InputType::Float2 | InputType::Integer2 => 2,
            InputType::Float3 | InputType::Integer3 => 3,
            InputType::Float4 | InputType::Integer4 => 4,
            InputType::Image | InputType::String => 0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputWidget {
    #[default]
    None,
    Slider,
    Angle,
    Color,
    Boolean,
    Combobox,
}

/// Semantic of an output. Only used for naming and compression policy.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelUse {
    #[default]
    Unknown,
    Diffuse,
    BaseColor,
    Specular,
    Glossiness,
    Roughness,
    Metallic,
    Normal,
    Height,
    Opacity,
    Emissive,
    AmbientOcclusion,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InputDesc {
    #[serde(rename = "@uid")]
    pub uid: u32,
    #[serde(rename = "@identifier")]
    pub identifier: String,
    #[serde(rename = "@label", default)]
    pub label: String,
    #[serde(rename = "@group", default)]
    pub group: String,
    #[serde(rename = "@description", default)]
    pub description: String,
    #[serde(rename = "@type")]
    pub input_type: InputType,
    #[serde(rename = "@widget", default)]
    pub widget: InputWidget,
    #[serde(rename = "@default", default)]
    pub default: String,
    #[serde(rename = "@min", default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(rename = "@max", default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(rename = "Enum", default)]
    pub enum_values: Vec<EnumValueDesc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EnumValueDesc {
    #[serde(rename = "@value")]
    pub value: String,
    #[serde(rename = "@label")]
    pub label: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputDesc {
    #[serde(rename = "@uid")]
    pub uid: u32,
    #[serde(rename = "@identifier")]
    pub identifier: String,
    #[serde(rename = "@label", default)]
    pub label: String,
    #[serde(rename = "@channel", default)]
    pub channel: ChannelUse,
    #[serde(rename = "@format", default)]
    pub format: PixelFormat,
    #[serde(rename = "@width")]
    pub width: u32,
    #[serde(rename = "@height")]
    pub height: u32,
    /// 0 requests the full mip chain.
    #[serde(rename = "@mipmaps", default)]
    pub mipmaps: u32,
}

impl PackageDesc {
    /// Structural checks that don't need to know how values are interpreted. Value parsing is
    /// left to the consumer, which reports [`PackageError::InvalidValue`] itself.
    pub fn validate(&self) -> Result<(), PackageError> {
        if self.graphs.is_empty() {
            return Err(PackageError::NoGraphs);
        }

        if self.graphs.len() > u16::MAX as usize {
            return Err(PackageError::Malformed {
                reason: format!("{} graphs exceed the addressable range", self.graphs.len()),
            });
        }

        let mut output_uids = HashSet::new();
        for graph in &self.graphs {
            if graph.outputs.is_empty() {
                warn!("Graph {} has no outputs and will never render", graph.label);
            }

            let mut input_uids = HashSet::new();
            for input in &graph.inputs {
                if !input_uids.insert(input.uid) {
                    return Err(PackageError::DuplicateInput {
                        graph: graph.label.clone(),
                        uid: input.uid,
                    });
                }
            }

            for output in &graph.outputs {
                if !output_uids.insert(output.uid) {
                    return Err(PackageError::DuplicateOutput { uid: output.uid });
                }

                if output.width == 0 || output.height == 0 || output.width > 0xFFFF || output.height > 0xFFFF {
                    return Err(PackageError::InvalidOutputSize {
                        uid: output.uid,
                        width: output.width,
                        height: output.height,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn output_count(&self) -> usize {
        self.graphs.iter().map(|graph| graph.outputs.len()).sum()
    }
}

impl GraphDesc {
    pub fn has_channel(&self, channel: ChannelUse) -> bool {
        self.outputs.iter().any(|output| output.channel == channel)
    }
}
