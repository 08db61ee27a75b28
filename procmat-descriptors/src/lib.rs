//! Description records that cross the boundary between the procedural material core and the
//! outside world: the package a renderer instantiates graphs from, the material descriptor
//! (`.smtl`) that stores customized parameters and per-output settings, and the texture
//! sidecar (`.sub`) that maps a texture path back to its material and output.
//!
//! All records are plain serde types, the XML representation is produced through quick-xml.
use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

pub mod format;
pub mod material;
pub mod package;
pub mod texture;

#[derive(Error, Debug)]
pub enum DescriptorError {
    #[error("The descriptor is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Failed to deserialize descriptor: {0}")]
    Deserialize(#[from] quick_xml::de::DeError),

    #[error("Failed to serialize descriptor: {0}")]
    Serialize(#[from] quick_xml::se::SeError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PackageError {
    #[error("The package does not contain any graph")]
    NoGraphs,

    #[error("Graph {graph} declares the input uid {uid} more than once")]
    DuplicateInput { graph: String, uid: u32 },

    #[error("The package declares the output uid {uid} more than once")]
    DuplicateOutput { uid: u32 },

    #[error("Output {uid} has an invalid size of {width}x{height}")]
    InvalidOutputSize { uid: u32, width: u32, height: u32 },

    #[error("Input {identifier} of graph {graph} has an unparsable {what} value \"{value}\"")]
    InvalidValue {
        graph: String,
        identifier: String,
        what: &'static str,
        value: String,
    },

    #[error("The package could not be read: {reason}")]
    Malformed { reason: String },
}

impl From<DescriptorError> for PackageError {
    fn from(value: DescriptorError) -> Self {
        PackageError::Malformed {
            reason: value.to_string(),
        }
    }
}

pub fn deserialize_xml<T: DeserializeOwned>(data: &[u8]) -> Result<T, DescriptorError> {
    let text = std::str::from_utf8(data)?;
    Ok(from_str(text)?)
}

pub fn serialize_xml<T: Serialize>(value: &T) -> Result<Vec<u8>, DescriptorError> {
    Ok(to_string(value)?.into_bytes())
}
