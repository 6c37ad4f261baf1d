//! Tileset selection state consumed by the style engine

use std::collections::HashSet;

use super::content::TileContent;
use super::tile::{Tile, TileId};

/// Tiles plus the selection lists produced by the selector each frame
#[derive(Debug, Default)]
pub struct Tileset {
    /// Whether the tileset is ready for rendering
    pub ready: bool,
    /// All tiles, indexed by [`TileId`]
    pub tiles: Vec<Tile>,
    /// Tiles selected this frame
    pub selected_tiles: Vec<TileId>,
    /// Tiles selected this frame that were not selected last frame
    pub newly_selected_tiles: Vec<TileId>,
}

impl Tileset {
    /// Create an empty tileset that is ready for rendering
    pub fn new() -> Self {
        Self {
            ready: true,
            ..Default::default()
        }
    }

    /// Add a tile and return its id
    pub fn add_tile(&mut self, content: TileContent) -> TileId {
        self.tiles.push(Tile::new(content));
        TileId(self.tiles.len() - 1)
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id.0)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id.0)
    }

    /// Get total tile count
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Replace this frame's selection.
    ///
    /// Clears the `selected` flag of the previous selection, flags the new one,
    /// and records as newly selected every tile that was not selected in the
    /// previous frame. Unknown ids are dropped; duplicates keep their first
    /// occurrence.
    pub fn update_selection<I: IntoIterator<Item = TileId>>(&mut self, ids: I) {
        let previous: HashSet<TileId> = self.selected_tiles.iter().copied().collect();
        for id in &self.selected_tiles {
            if let Some(tile) = self.tiles.get_mut(id.0) {
                tile.selected = false;
            }
        }

        let mut seen = HashSet::new();
        let selected: Vec<TileId> = ids
            .into_iter()
            .filter(|id| id.0 < self.tiles.len() && seen.insert(*id))
            .collect();

        for id in &selected {
            self.tiles[id.0].selected = true;
        }

        self.newly_selected_tiles = selected
            .iter()
            .copied()
            .filter(|id| !previous.contains(id))
            .collect();
        self.selected_tiles = selected;
    }

    /// Deselect a tile without rebuilding the selection lists
    pub fn revoke_selection(&mut self, id: TileId) {
        if let Some(tile) = self.tile_mut(id) {
            tile.selected = false;
        }
    }
}
