use serde_derive::{Deserialize, Serialize};

use crate::format::PixelFormat;

/// The persisted state of a procedural material: which package it instantiates, the input
/// values that differ from the package defaults and per output settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename = "ProceduralMaterial")]
pub struct MaterialDescriptor {
    #[serde(rename = "@source")]
    pub source: String,
    #[serde(rename = "Parameter", default)]
    pub parameters: Vec<ParameterDesc>,
    #[serde(rename = "Output", default)]
    pub outputs: Vec<OutputInfoDesc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterDesc {
    #[serde(rename = "@graph")]
    pub graph_index: i32,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@value")]
    pub value: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutputInfoDesc {
    #[serde(rename = "@uid")]
    pub uid: u32,
    #[serde(rename = "@enabled", default = "enabled_default")]
    pub enabled: bool,
    #[serde(rename = "@compressed", default = "enabled_default")]
    pub compressed: bool,
    #[serde(rename = "Format", default, skip_serializing_if = "Option::is_none")]
    pub format_override: Option<OutputFormatOverride>,
}

fn enabled_default() -> bool {
    true
}

/// Replaces parts of the package's output format. Absent fields keep the package value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputFormatOverride {
    #[serde(rename = "@format", default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PixelFormat>,
    #[serde(rename = "@width", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(rename = "@height", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(rename = "@mipmaps", default, skip_serializing_if = "Option::is_none")]
    pub mipmaps: Option<u32>,
}

impl OutputFormatOverride {
    pub fn is_default(&self) -> bool {
        *self == OutputFormatOverride::default()
    }
}

impl MaterialDescriptor {
    pub fn output_info(&self, uid: u32) -> Option<&OutputInfoDesc> {
        self.outputs.iter().find(|output| output.uid == uid)
    }
}
