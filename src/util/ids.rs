//! Flat integer identifiers handed across the module boundary in place of live objects.
//!
//! A [`GraphInstanceId`] packs the owning material's id into the high 16 bits and the graph's
//! index within that material into the low 16 bits. Ids are stable for the lifetime of a
//! material but are not unique over the process lifetime: after a material is removed or
//! reimported, callers have to resolve them again.
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MaterialId(pub u16);

impl MaterialId {
    pub const INVALID: MaterialId = MaterialId(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GraphInstanceId(pub u32);

impl GraphInstanceId {
    pub const INVALID: GraphInstanceId = GraphInstanceId(0);

    /// Packs the pair without any range check, see `MaterialSystem::graph_instance_id` for the
    /// checked variant.
    pub fn encode(material: MaterialId, graph_index: u16) -> Self {
        Self(((material.0 as u32) << 16) | graph_index as u32)
    }

    pub fn decode(self) -> (MaterialId, u16) {
        (self.material_id(), self.graph_index())
    }

    pub fn material_id(self) -> MaterialId {
        MaterialId((self.0 >> 16) as u16)
    }

    pub fn graph_index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Handle of a batch dispatched to the renderer. `INVALID` means nothing was dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RenderUid(pub u32);

impl RenderUid {
    pub const INVALID: RenderUid = RenderUid(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl Display for MaterialId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for GraphInstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.material_id().0, self.graph_index())
    }
}

impl Display for RenderUid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
