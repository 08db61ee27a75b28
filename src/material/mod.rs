use std::collections::BTreeMap;

use procmat_descriptors::package::PackageDesc;
use slotmap::new_key_type;

use crate::util::ids::MaterialId;

pub mod graph;
pub mod texture;
pub mod value;
pub mod views;

new_key_type! {
    /// Generation checked handle of a loaded material.
    pub struct MaterialKey;
    /// Generation checked handle of a graph instance. Stale after its material is removed or
    /// reimported.
    pub struct GraphKey;
    pub struct TextureKey;
}

/// A loaded material: the graphs instantiated from its package and the textures backing their
/// static outputs. Graphs and textures live in the arenas of the `MaterialSystem`.
#[derive(Debug)]
pub struct ProceduralMaterial {
    pub(crate) path: String,
    pub(crate) source: String,
    pub(crate) id: MaterialId,
    pub(crate) package: PackageDesc,
    pub(crate) graphs: Vec<GraphKey>,
    pub(crate) textures: Vec<TextureKey>,
    /// Bound image inputs, keyed by graph and input uid.
    pub(crate) image_inputs: BTreeMap<(GraphKey, u32), String>,
    pub(crate) last_reset_generation: u32,
}

impl ProceduralMaterial {
    pub fn new(path: &str, source: &str, package: PackageDesc) -> Self {
        Self {
            path: path.to_string(),
            source: source.to_string(),
            id: MaterialId::INVALID,
            package,
            graphs: Vec::new(),
            textures: Vec::new(),
            image_inputs: BTreeMap::new(),
            last_reset_generation: 0,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path of the package the graphs are instantiated from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// `MaterialId::INVALID` until registered.
    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn graphs(&self) -> &[GraphKey] {
        &self.graphs
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn textures(&self) -> &[TextureKey] {
        &self.textures
    }

    pub fn image_input(&self, graph: GraphKey, input_uid: u32) -> Option<&str> {
        self.image_inputs
            .get(&(graph, input_uid))
            .map(String::as_str)
    }

    /// Collects the image bindings of `graph` into `pending`.
    pub(crate) fn add_image_inputs(&self, graph: GraphKey, pending: &mut BTreeMap<(GraphKey, u32), String>) {
        for ((bound_graph, uid), path) in self.image_inputs.range((graph, 0)..=(graph, u32::MAX)) {
            pending.insert((*bound_graph, *uid), path.clone());
        }
    }
}
