//! Per-frame styling counters for diagnostics overlays

use std::fmt;

/// Tiles and features styled in the current frame, plus the previous frame's
/// totals. The previous totals are `None` until a first frame completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleStatistics {
    pub tiles_styled: usize,
    pub features_styled: usize,
    pub last_tiles_styled: Option<usize>,
    pub last_features_styled: Option<usize>,
}

impl StyleStatistics {
    /// Archive the running totals and reset them for a new frame
    pub fn begin_frame(&mut self) {
        self.last_tiles_styled = Some(self.tiles_styled);
        self.last_features_styled = Some(self.features_styled);
        self.tiles_styled = 0;
        self.features_styled = 0;
    }

    pub(crate) fn record_tile(&mut self) {
        self.tiles_styled += 1;
    }

    pub(crate) fn record_features(&mut self, count: usize) {
        self.features_styled += count;
    }
}

impl fmt::Display for StyleStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "styled {} tiles / {} features",
            self.tiles_styled, self.features_styled
        )?;
        if let (Some(tiles), Some(features)) = (self.last_tiles_styled, self.last_features_styled) {
            write!(f, " (last frame: {tiles} / {features})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_frame_archives_totals() {
        let mut stats = StyleStatistics::default();
        assert_eq!(stats.last_tiles_styled, None);

        stats.record_tile();
        stats.record_features(8);
        stats.begin_frame();

        assert_eq!(stats.tiles_styled, 0);
        assert_eq!(stats.features_styled, 0);
        assert_eq!(stats.last_tiles_styled, Some(1));
        assert_eq!(stats.last_features_styled, Some(8));
        assert_eq!(stats.to_string(), "styled 0 tiles / 0 features (last frame: 1 / 8)");
    }
}
