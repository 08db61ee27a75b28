pub mod common;
pub mod descriptors;
pub mod fs;
