use std::collections::HashMap;

use crate::material::TextureKey;
use crate::rendering::common::types::RenderResult;

/// The latest rendered pixels per texture, held until the upload consumes them.
#[derive(Debug, Default)]
pub struct ResultCache {
    results: HashMap<TextureKey, RenderResult>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a result nobody consumed yet.
    pub fn store(&mut self, texture: TextureKey, result: RenderResult) {
        self.results.insert(texture, result);
    }

    pub fn take(&mut self, texture: TextureKey) -> Option<RenderResult> {
        self.results.remove(&texture)
    }

    pub fn contains(&self, texture: TextureKey) -> bool {
        self.results.contains_key(&texture)
    }

    pub fn purge(&mut self, texture: TextureKey) {
        self.results.remove(&texture);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
