use serde_derive::{Deserialize, Serialize};

/// The sidecar file written next to a material for each of its static outputs. Engines refer to
/// the sidecar path like to any other texture, the core resolves it back to the output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename = "ProceduralTexture")]
pub struct TextureDescriptor {
    #[serde(rename = "@material")]
    pub material: String,
    #[serde(rename = "@output")]
    pub output_uid: u32,
}
