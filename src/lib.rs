//! Incremental feature styling for streamed 3D Tiles.
//!
//! Each frame the tile selector produces the selected tiles and the subset that
//! became visible this frame. [`StyleEngine::apply_style`] assigns every feature
//! of those tiles a color and a show flag from the current [`Style`], walking
//! composite content down to its feature batches. Tiles already styled for the
//! current style epoch are skipped, so a stable style only costs work for tiles
//! entering the view.
//!
//! ```
//! use std::sync::Arc;
//! use forge3d_tilestyle::{
//!     parse_style_str, FeatureBatch, FrameState, StyleEngine, TileContent, Tileset,
//! };
//!
//! let style = parse_style_str(r##"{
//!     "color": { "propertyName": "height",
//!                "colors": [ { "maximum": 10, "color": "#ff0000" },
//!                            { "maximum": 50, "color": "#0000ff" } ] },
//!     "show": [">", ["get", "height"], 2]
//! }"##).unwrap();
//!
//! let mut tileset = Tileset::new();
//! let batch = FeatureBatch::new(2).with_property("height", [1.0, 20.0]);
//! let tile = tileset.add_tile(TileContent::batched(batch));
//! tileset.update_selection([tile]);
//!
//! let mut engine = StyleEngine::new();
//! engine.set_style(Some(Arc::new(style)));
//! engine.apply_style(&mut tileset, &FrameState::render(0.0));
//! assert_eq!(engine.statistics().features_styled, 2);
//! ```

pub mod color;
pub mod error;
pub mod statistics;
pub mod style;
pub mod style_engine;
pub mod tiles3d;

pub use color::{parse_color_string, Color};
pub use error::{StyleError, StyleResult};
pub use statistics::StyleStatistics;
pub use style::{
    parse_style, parse_style_str, ColorBin, ColorBinTable, ColorRule, ConstantShow, EvalContext,
    JsonExpression, ShowExpression, Style,
};
pub use style_engine::{EngineConfig, FrameState, RenderPass, StyleEngine, StyleEpoch};
pub use tiles3d::{
    decode_content, load_content, FeatureBatch, FeatureView, PropertyValue, Tile, TileContent,
    TileId, Tileset,
};
