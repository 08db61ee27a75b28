use std::sync::Arc;

use procmat_descriptors::PackageError;
use procmat_descriptors::package::PackageDesc;

use crate::material::GraphKey;
use crate::rendering::common::types::{GraphJob, RenderResult};
use crate::util::ids::RenderUid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// `run` returns once every output of the batch has been handed to the callbacks.
    Synchronous,
    Asynchronous,
}

/// Carried through the renderer as the user tag of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    #[default]
    Normal,
    /// Used for the initial render of a material, no device texture exists yet.
    SkipReloadTextures,
}

/// Limits for the renderer. `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub cores: Option<u32>,
    pub memory_budget_mb: Option<u32>,
}

impl RenderOptions {
    pub const UNLIMITED: RenderOptions = RenderOptions {
        cores: None,
        memory_budget_mb: None,
    };
}

/// Receives computed outputs. May be invoked from a thread owned by the renderer and must not
/// panic.
pub trait RenderCallbacks: Send + Sync {
    fn output_computed(&self, uid: RenderUid, mode: RenderMode, graph: GraphKey, output_index: usize, result: RenderResult);
}

/// The batch renderer executing graph jobs.
pub trait RenderBackend: Send + Sync {
    /// Parses a package as delivered by the host and validates it.
    fn load_package(&self, data: &[u8]) -> Result<PackageDesc, PackageError>;

    fn set_callbacks(&self, callbacks: Arc<dyn RenderCallbacks>);

    fn set_options(&self, options: RenderOptions);

    /// Stages a job for the next `run`.
    fn push(&self, job: GraphJob);

    /// Dispatches all staged jobs as one batch.
    fn run(&self, run_mode: RunMode, mode: RenderMode) -> RenderUid;

    fn is_pending(&self, uid: RenderUid) -> bool;

    /// Blocks until no batch is outstanding.
    fn flush(&self);
}
