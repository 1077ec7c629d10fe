use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    cell::{DoorDirection, ItemKind, WallDirection},
    error::ConfigurationError,
};

/// Every kind of tile a renderer has to be able to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileArchetype {
    Door(DoorDirection),
    Wall(WallDirection),
    Floor,
    Pit,
    Item(ItemKind),
}

impl TileArchetype {
    /// All archetypes, doors first, then walls, floor, pit and items.
    pub fn all() -> impl Iterator<Item = TileArchetype> {
        let doors = DoorDirection::ALL.into_iter().map(TileArchetype::Door);
        let walls = WallDirection::ALL.into_iter().map(TileArchetype::Wall);
        let items = [ItemKind::Coin, ItemKind::Key, ItemKind::Bomb]
            .into_iter()
            .map(TileArchetype::Item);
        doors
            .chain(walls)
            .chain([TileArchetype::Floor, TileArchetype::Pit])
            .chain(items)
    }
}

/// Lookup from tile archetype to whatever handle the host renders with.
#[derive(Debug, Clone)]
pub struct TilePalette<H> {
    tiles: HashMap<TileArchetype, H>,
}

impl<H> Default for TilePalette<H> {
    fn default() -> Self {
        TilePalette {
            tiles: HashMap::new(),
        }
    }
}

impl<H> TilePalette<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a palette by asking `f` for a handle for every archetype.
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(TileArchetype) -> H,
    {
        TilePalette {
            tiles: TileArchetype::all().map(|a| (a, f(a))).collect(),
        }
    }

    /// Registers a handle, returning the one it replaced.
    pub fn insert(&mut self, archetype: TileArchetype, handle: H) -> Option<H> {
        self.tiles.insert(archetype, handle)
    }

    pub fn remove(&mut self, archetype: TileArchetype) -> Option<H> {
        self.tiles.remove(&archetype)
    }

    pub fn get(&self, archetype: TileArchetype) -> Option<&H> {
        self.tiles.get(&archetype)
    }

    /// Like [`TilePalette::get`], but a missing entry is a configuration error.
    pub fn resolve(&self, archetype: TileArchetype) -> Result<&H, ConfigurationError> {
        self.tiles
            .get(&archetype)
            .ok_or(ConfigurationError::MissingTile(archetype))
    }

    /// Archetypes without a registered handle.
    pub fn missing(&self) -> Vec<TileArchetype> {
        TileArchetype::all()
            .filter(|a| !self.tiles.contains_key(a))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_archetypes_are_distinct() {
        let all: Vec<_> = TileArchetype::all().collect();
        assert_eq!(all.len(), 17);
        let unique: std::collections::HashSet<_> = all.iter().copied().collect();
        assert_eq!(unique.len(), 17);
    }

    #[test]
    fn test_from_fn_is_complete() {
        let palette = TilePalette::from_fn(|a| format!("{:?}", a));
        assert!(palette.missing().is_empty());
        assert_eq!(palette.get(TileArchetype::Pit), Some(&"Pit".to_string()));
    }

    #[test]
    fn test_resolve_reports_missing_archetype() {
        let mut palette = TilePalette::from_fn(|_| 'x');
        palette.remove(TileArchetype::Door(DoorDirection::Left));
        assert_eq!(
            palette.resolve(TileArchetype::Door(DoorDirection::Left)),
            Err(ConfigurationError::MissingTile(TileArchetype::Door(
                DoorDirection::Left
            )))
        );
        assert_eq!(
            palette.missing(),
            vec![TileArchetype::Door(DoorDirection::Left)]
        );
        assert_eq!(palette.resolve(TileArchetype::Floor), Ok(&'x'));
    }
}
