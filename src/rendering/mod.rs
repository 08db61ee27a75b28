/// The contract between the material system and the batch renderer.
pub mod backend;
pub mod common;
pub mod worker;
