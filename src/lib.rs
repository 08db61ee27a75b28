//! Render scheduling and result caching for procedural materials.
//!
//! A [`system::MaterialSystem`] owns every loaded material, queues dirty graphs, dispatches them
//! to a [`rendering::backend::RenderBackend`] and relays the computed outputs back to the host
//! on the owning thread.
use procmat_descriptors::{DescriptorError, PackageError};
use thiserror::Error;

pub mod io;
pub mod material;
pub mod rendering;
pub mod settings;
pub mod system;
pub mod util;

#[derive(Error, Debug)]
pub enum MaterialError {
    #[error("Failed to read {path}")]
    ReadFailed { path: String },
    #[error("Failed to write {path}")]
    WriteFailed { path: String },
    #[error("Descriptor {path} is invalid")]
    Descriptor {
        path: String,
        #[source]
        source: DescriptorError,
    },
    #[error("Package {path} is invalid")]
    Package {
        path: String,
        #[source]
        source: PackageError,
    },
    #[error("No material id left to register {path}")]
    Registration { path: String },
    #[error("The material is not loaded")]
    UnknownMaterial,
}
