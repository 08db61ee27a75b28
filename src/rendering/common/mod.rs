/// Pixel format properties, sizes and the engine side of the format mapping.
pub mod texture_format;
/// Jobs handed to the renderer and the results it hands back.
pub mod types;
