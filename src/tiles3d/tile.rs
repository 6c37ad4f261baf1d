//! Tile structure for styling

use super::content::TileContent;
use crate::style_engine::StyleEpoch;

/// Index of a tile in its [`Tileset`](super::Tileset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(pub usize);

/// A tile as seen by the style engine
#[derive(Debug, Clone)]
pub struct Tile {
    /// Set by the selector for tiles chosen for rendering this frame
    pub selected: bool,
    /// Decoded payload
    pub content: TileContent,
    /// Epoch in which the style was last applied; `None` until first styled.
    /// Written only by the style engine.
    pub last_style_time: Option<StyleEpoch>,
}

impl Tile {
    pub fn new(content: TileContent) -> Self {
        Self {
            selected: false,
            content,
            last_style_time: None,
        }
    }

    /// Total number of features in this tile's content
    pub fn feature_count(&self) -> usize {
        self.content.feature_count()
    }
}

impl Default for Tile {
    fn default() -> Self {
        Self::new(TileContent::default())
    }
}
