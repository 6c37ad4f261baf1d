//! Tile content tree

use super::feature::FeatureBatch;

/// Payload of a tile: either a flat feature collection or a composite of
/// nested payloads (`cmpt`), which may itself contain composites.
#[derive(Debug, Clone)]
pub enum TileContent {
    /// Batched features (b3dm, pnts, i3dm)
    Batched(FeatureBatch),
    /// Inner contents in payload order
    Composite(Vec<TileContent>),
}

impl TileContent {
    pub fn batched(batch: FeatureBatch) -> Self {
        Self::Batched(batch)
    }

    pub fn composite(inner: Vec<TileContent>) -> Self {
        Self::Composite(inner)
    }

    /// Check if this content is a composite container
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Total number of features across all leaf contents
    pub fn feature_count(&self) -> usize {
        match self {
            Self::Batched(batch) => batch.len(),
            Self::Composite(inner) => inner.iter().map(TileContent::feature_count).sum(),
        }
    }

    /// Leaf batches in depth-first order
    pub fn batches(&self) -> Vec<&FeatureBatch> {
        let mut out = Vec::new();
        self.collect_batches(&mut out);
        out
    }

    fn collect_batches<'a>(&'a self, out: &mut Vec<&'a FeatureBatch>) {
        match self {
            Self::Batched(batch) => out.push(batch),
            Self::Composite(inner) => {
                for content in inner {
                    content.collect_batches(out);
                }
            }
        }
    }
}

impl Default for TileContent {
    fn default() -> Self {
        Self::Batched(FeatureBatch::new(0))
    }
}
