use std::collections::BTreeMap;

use log::{trace, warn};

use crate::material::{MaterialKey, ProceduralMaterial, TextureKey};
use crate::util::ids::MaterialId;

/// Indexes the loaded materials by path and by id, and their textures by path.
#[derive(Debug)]
pub struct MaterialRegistry {
    last_id: u16,
    by_path: BTreeMap<String, MaterialKey>,
    by_id: BTreeMap<MaterialId, MaterialKey>,
    texture_paths: BTreeMap<String, TextureKey>,
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self {
            last_id: 0,
            by_path: BTreeMap::new(),
            by_id: BTreeMap::new(),
            texture_paths: BTreeMap::new(),
        }
    }

    /// Assigns the next id to `material`. Ids are never reused, `None` once they are exhausted.
    pub fn register(&mut self, key: MaterialKey, material: &mut ProceduralMaterial) -> Option<MaterialId> {
        if self.by_path.contains_key(&material.path) {
            warn!("{} is already registered", material.path);
            return None;
        }

        let id = MaterialId(self.last_id.checked_add(1)?);
        self.last_id = id.0;

        material.id = id;
        self.by_path.insert(material.path.clone(), key);
        self.by_id.insert(id, key);
        trace!("Registered {} as {}", material.path, id);
        Some(id)
    }

    pub fn unregister(&mut self, material: &ProceduralMaterial) {
        self.by_path.remove(&material.path);
        self.by_id.remove(&material.id);
    }

    pub fn find_by_path(&self, path: &str) -> Option<MaterialKey> {
        self.by_path.get(path).copied()
    }

    pub fn find_by_id(&self, id: MaterialId) -> Option<MaterialKey> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn register_texture_path(&mut self, path: &str, texture: TextureKey) {
        if let Some(previous) = self.texture_paths.insert(path.to_string(), texture) {
            if previous != texture {
                warn!("Texture path {} was claimed by another output", path);
            }
        }
    }

    pub fn texture_from_path(&self, path: &str) -> Option<TextureKey> {
        self.texture_paths.get(path).copied()
    }

    /// Forgets every path resolving to `texture`. Paths claimed by another texture since stay.
    pub fn unregister_texture(&mut self, texture: TextureKey) {
        self.texture_paths.retain(|_, registered| *registered != texture);
    }
}

#[cfg(test)]
mod tests {
    use procmat_descriptors::package::PackageDesc;
    use slotmap::SlotMap;

    use super::*;

    fn material(path: &str) -> ProceduralMaterial {
        ProceduralMaterial::new(path, "bricks.pkg", PackageDesc::default())
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut arena = SlotMap::<MaterialKey, ()>::with_key();
        let mut registry = MaterialRegistry::new();

        let first_key = arena.insert(());
        let mut first = material("a.smtl");
        assert_eq!(registry.register(first_key, &mut first), Some(MaterialId(1)));

        let second_key = arena.insert(());
        let mut second = material("b.smtl");
        assert_eq!(registry.register(second_key, &mut second), Some(MaterialId(2)));

        registry.unregister(&first);
        assert_eq!(registry.find_by_path("a.smtl"), None);
        assert_eq!(registry.find_by_id(MaterialId(1)), None);

        let mut third = material("a.smtl");
        assert_eq!(registry.register(first_key, &mut third), Some(MaterialId(3)));
        assert_eq!(registry.find_by_id(MaterialId(3)), Some(first_key));
        assert_eq!(registry.find_by_path("b.smtl"), Some(second_key));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn paths_are_unique() {
        let mut arena = SlotMap::<MaterialKey, ()>::with_key();
        let mut registry = MaterialRegistry::new();

        let mut first = material("a.smtl");
        let mut duplicate = material("a.smtl");
        assert!(registry.register(arena.insert(()), &mut first).is_some());
        assert!(registry.register(arena.insert(()), &mut duplicate).is_none());
        assert_eq!(duplicate.id, MaterialId::INVALID);
    }

    #[test]
    fn stale_texture_paths_do_not_evict_new_ones() {
        let mut arena = SlotMap::<TextureKey, ()>::with_key();
        let mut registry = MaterialRegistry::new();
        let old = arena.insert(());
        let new = arena.insert(());

        registry.register_texture_path("bricks_diff.sub", old);
        registry.register_texture_path("bricks_diff.sub", new);
        registry.unregister_texture(old);
        assert_eq!(registry.texture_from_path("bricks_diff.sub"), Some(new));

        registry.unregister_texture(new);
        assert_eq!(registry.texture_from_path("bricks_diff.sub"), None);
    }

    #[test]
    fn aliases_are_forgotten_with_their_texture() {
        let mut arena = SlotMap::<TextureKey, ()>::with_key();
        let mut registry = MaterialRegistry::new();
        let texture = arena.insert(());
        let other = arena.insert(());

        registry.register_texture_path("bricks_diff.sub", texture);
        registry.register_texture_path("shared/bricks.sub", texture);
        registry.register_texture_path("bricks_ddn.sub", other);
        registry.unregister_texture(texture);

        assert_eq!(registry.texture_from_path("bricks_diff.sub"), None);
        assert_eq!(registry.texture_from_path("shared/bricks.sub"), None);
        assert_eq!(registry.texture_from_path("bricks_ddn.sub"), Some(other));
    }
}
