//! Incremental application of a style to the selected tiles of a tileset.
//!
//! Restyling every feature of every visible tile each frame is too expensive,
//! so the engine tracks a style epoch. The epoch advances once per frame in
//! which all selected tiles must be restyled (a new style was assigned, the
//! engine was marked dirty, or the style is time dynamic). In any other frame
//! only the newly selected tiles are visited. Each tile remembers the epoch it
//! was last styled in and is styled at most once per epoch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::StyleResult;
use crate::statistics::StyleStatistics;
use crate::style::{EvalContext, Style};
use crate::tiles3d::{FeatureBatch, TileContent, Tileset};

/// Style generation counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleEpoch(u64);

impl StyleEpoch {
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Which pass of the frame is being prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPass {
    /// Primary color pass
    Render,
    /// Auxiliary picking pass (e.g. mouse-over)
    Pick,
}

/// Per-frame input to [`StyleEngine::apply_style`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub pass: RenderPass,
    /// Frame time in seconds, visible to time-dynamic styles
    pub time: f64,
}

impl FrameState {
    pub fn render(time: f64) -> Self {
        Self {
            pass: RenderPass::Render,
            time,
        }
    }

    pub fn pick(time: f64) -> Self {
        Self {
            pass: RenderPass::Pick,
            time,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Color written to every feature while no style is assigned
    pub neutral_color: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            neutral_color: Color::WHITE,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> StyleResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_neutral_color(mut self, color: Color) -> Self {
        self.neutral_color = color;
        self
    }
}

/// Applies the current style to tiles as they become visible.
#[derive(Debug, Default)]
pub struct StyleEngine {
    style: Option<Arc<Style>>,
    style_dirty: bool,
    epoch: StyleEpoch,
    statistics: StyleStatistics,
    config: EngineConfig,
}

impl StyleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Currently assigned style
    pub fn style(&self) -> Option<&Arc<Style>> {
        self.style.as_ref()
    }

    /// Replace the style. `None` resets features to the neutral state.
    /// Takes effect at the next color pass.
    pub fn set_style(&mut self, style: Option<Arc<Style>>) {
        log::debug!(
            "style {}",
            if style.is_some() { "assigned" } else { "removed" }
        );
        self.style = style;
        self.style_dirty = true;
    }

    /// Force a full restyle without changing the style, e.g. after data the
    /// style depends on was reloaded.
    pub fn make_dirty(&mut self) {
        self.style_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.style_dirty
    }

    pub fn epoch(&self) -> StyleEpoch {
        self.epoch
    }

    pub fn statistics(&self) -> &StyleStatistics {
        &self.statistics
    }

    /// Style the tiles that need it this frame.
    pub fn apply_style(&mut self, tileset: &mut Tileset, frame: &FrameState) {
        if !tileset.ready {
            return;
        }

        self.statistics.begin_frame();

        let style_dirty = self.style_dirty;
        if frame.pass == RenderPass::Render {
            // Picking passes leave the flag for the next color pass
            self.style_dirty = false;
        }

        let time_dynamic = self.style.as_ref().is_some_and(|s| s.is_time_dynamic());
        let apply_to_all_selected = style_dirty || time_dynamic;
        if apply_to_all_selected {
            self.epoch = self.epoch.next();
            log::debug!(
                "restyling all {} selected tiles at epoch {}",
                tileset.selected_tiles.len(),
                self.epoch.value()
            );
        }

        let epoch = self.epoch;
        let style = self.style.as_deref();
        let Tileset {
            tiles,
            selected_tiles,
            newly_selected_tiles,
            ..
        } = tileset;
        let candidates = if apply_to_all_selected {
            &selected_tiles[..]
        } else {
            &newly_selected_tiles[..]
        };

        for &id in candidates {
            let Some(tile) = tiles.get_mut(id.0) else {
                log::warn!("selection refers to unknown tile {}", id.0);
                continue;
            };
            // Selection may have been revoked after the list was built
            if !tile.selected || tile.last_style_time == Some(epoch) {
                continue;
            }

            tile.last_style_time = Some(epoch);
            style_content(
                &mut tile.content,
                style,
                &self.config,
                frame.time,
                &mut self.statistics,
            );
            self.statistics.record_tile();
            log::trace!("styled tile {} at epoch {}", id.0, epoch.value());
        }
    }
}

/// Style a content tree depth-first, composites in payload order.
fn style_content(
    content: &mut TileContent,
    style: Option<&Style>,
    config: &EngineConfig,
    time: f64,
    stats: &mut StyleStatistics,
) {
    match content {
        TileContent::Composite(inner) => {
            for child in inner {
                style_content(child, style, config, time, stats);
            }
        }
        TileContent::Batched(batch) => style_batch(batch, style, config, time, stats),
    }
}

fn style_batch(
    batch: &mut FeatureBatch,
    style: Option<&Style>,
    config: &EngineConfig,
    time: f64,
    stats: &mut StyleStatistics,
) {
    stats.record_features(batch.len());

    let Some(style) = style else {
        batch.reset_style(config.neutral_color);
        return;
    };

    for index in 0..batch.len() {
        if let Some(feature) = batch.feature(index) {
            let (color, show) = style.evaluate(&EvalContext::new(feature, time));
            batch.set_style(index, color, show);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorBin, ColorBinTable, ColorRule, ConstantShow};
    use crate::tiles3d::TileId;

    const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);

    fn red_style() -> Arc<Style> {
        let bins = ColorBinTable::new(vec![ColorBin::new(1.0, RED)]).unwrap();
        Arc::new(Style::new(ColorRule::new("h", bins), Box::new(ConstantShow(false))))
    }

    fn single_tile() -> (Tileset, TileId) {
        let mut tileset = Tileset::new();
        let id = tileset.add_tile(TileContent::batched(FeatureBatch::new(2)));
        tileset.update_selection([id]);
        (tileset, id)
    }

    #[test]
    fn test_not_ready_is_a_no_op() {
        let (mut tileset, id) = single_tile();
        tileset.ready = false;
        let mut engine = StyleEngine::new();
        engine.set_style(Some(red_style()));

        engine.apply_style(&mut tileset, &FrameState::render(0.0));

        assert!(engine.is_dirty());
        assert_eq!(engine.epoch().value(), 0);
        assert_eq!(engine.statistics(), &StyleStatistics::default());
        assert_eq!(tileset.tile(id).unwrap().last_style_time, None);
    }

    #[test]
    fn test_epoch_advances_once_per_full_restyle() {
        let (mut tileset, id) = single_tile();
        let mut engine = StyleEngine::new();
        engine.set_style(Some(red_style()));

        engine.apply_style(&mut tileset, &FrameState::render(0.0));
        assert_eq!(engine.epoch().value(), 1);
        assert_eq!(tileset.tile(id).unwrap().last_style_time, Some(engine.epoch()));

        engine.apply_style(&mut tileset, &FrameState::render(0.1));
        assert_eq!(engine.epoch().value(), 1);

        engine.make_dirty();
        engine.apply_style(&mut tileset, &FrameState::render(0.2));
        assert_eq!(engine.epoch().value(), 2);
    }

    #[test]
    fn test_unstyled_tile_gets_neutral_color() {
        let mut tileset = Tileset::new();
        let mut batch = FeatureBatch::new(3);
        batch.set_style(1, RED, false);
        let id = tileset.add_tile(TileContent::batched(batch));
        tileset.update_selection([id]);

        let gray = Color::new(0.5, 0.5, 0.5, 1.0);
        let mut engine = StyleEngine::with_config(EngineConfig::default().with_neutral_color(gray));
        engine.apply_style(&mut tileset, &FrameState::render(0.0));

        let TileContent::Batched(batch) = &tileset.tile(id).unwrap().content else {
            panic!("expected batched content");
        };
        assert!(batch.colors().iter().all(|&c| c == gray));
        assert!(batch.show_flags().iter().all(|&s| s));
        assert_eq!(engine.statistics().features_styled, 3);
    }

    #[test]
    fn test_unknown_tile_ids_are_skipped() {
        let (mut tileset, _) = single_tile();
        tileset.newly_selected_tiles.push(TileId(42));
        let mut engine = StyleEngine::new();

        engine.apply_style(&mut tileset, &FrameState::render(0.0));
        assert_eq!(engine.statistics().tiles_styled, 1);
    }

    #[test]
    fn test_config_from_json() {
        let config = EngineConfig::from_json(r##"{"neutralColor":"#808080"}"##).unwrap();
        assert!((config.neutral_color.r - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(EngineConfig::from_json("{}").unwrap(), EngineConfig::default());
        assert!(EngineConfig::from_json(r#"{"neutralColor":"bogus"}"#).is_err());
    }
}
