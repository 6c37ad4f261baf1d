//! 3D Tiles content as seen by the style engine
//!
//! Decodes the feature and batch tables of b3dm, pnts, i3dm and cmpt payloads
//! into feature batches, and holds the per-frame tile selection.

mod b3dm;
mod batch_table;
mod cmpt;
mod content;
mod feature;
mod i3dm;
mod pnts;
mod tile;
mod tileset;

pub use b3dm::{decode_b3dm, B3dmHeader};
pub use cmpt::{decode_cmpt, decode_content, load_content, CmptHeader};
pub use content::TileContent;
pub use feature::{FeatureBatch, FeatureView, PropertyValue};
pub use i3dm::{decode_i3dm, I3dmHeader};
pub use pnts::decode_pnts;
pub use tile::{Tile, TileId};
pub use tileset::Tileset;
