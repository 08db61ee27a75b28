use procmat_descriptors::material::MaterialDescriptor;
use procmat_descriptors::texture::TextureDescriptor;
use procmat_descriptors::{DescriptorError, deserialize_xml, serialize_xml};

/// Reads and writes the material descriptor (`.smtl`) and the texture sidecar (`.sub`).
pub trait DescriptorCodec {
    fn decode_material(&self, data: &[u8]) -> Result<MaterialDescriptor, DescriptorError>;

    fn encode_material(&self, descriptor: &MaterialDescriptor) -> Result<Vec<u8>, DescriptorError>;

    fn decode_texture(&self, data: &[u8]) -> Result<TextureDescriptor, DescriptorError>;

    fn encode_texture(&self, descriptor: &TextureDescriptor) -> Result<Vec<u8>, DescriptorError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XmlDescriptorCodec;

impl DescriptorCodec for XmlDescriptorCodec {
    fn decode_material(&self, data: &[u8]) -> Result<MaterialDescriptor, DescriptorError> {
        deserialize_xml(data)
    }

    fn encode_material(&self, descriptor: &MaterialDescriptor) -> Result<Vec<u8>, DescriptorError> {
        serialize_xml(descriptor)
    }

    fn decode_texture(&self, data: &[u8]) -> Result<TextureDescriptor, DescriptorError> {
        deserialize_xml(data)
    }

    fn encode_texture(&self, descriptor: &TextureDescriptor) -> Result<Vec<u8>, DescriptorError> {
        serialize_xml(descriptor)
    }
}
