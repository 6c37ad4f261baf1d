//! CMPT (Composite) payload decoding and format dispatch

use std::path::Path;

use bytemuck::{Pod, Zeroable};

use super::b3dm::decode_b3dm;
use super::content::TileContent;
use super::i3dm::decode_i3dm;
use super::pnts::decode_pnts;
use crate::error::{StyleError, StyleResult};

/// CMPT file header (16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CmptHeader {
    /// Magic bytes "cmpt"
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
    /// Number of inner tiles
    pub tiles_length: u32,
}

impl CmptHeader {
    pub const SIZE: usize = 16;
}

/// Decode a composite payload into its inner contents, recursively.
pub fn decode_cmpt(data: &[u8]) -> StyleResult<TileContent> {
    if data.len() < CmptHeader::SIZE {
        return Err(StyleError::invalid_content("cmpt: file too small for header"));
    }
    let header: CmptHeader = bytemuck::pod_read_unaligned(&data[..CmptHeader::SIZE]);
    if &header.magic != b"cmpt" {
        return Err(StyleError::invalid_content(format!(
            "cmpt: invalid magic {:?}",
            header.magic
        )));
    }
    if header.version != 1 {
        return Err(StyleError::unsupported(format!("cmpt version {}", header.version)));
    }

    let mut offset = CmptHeader::SIZE;
    // tilesLength is untrusted; grow as inner tiles actually decode
    let mut inner = Vec::new();

    for i in 0..header.tiles_length {
        // Every inner header carries its own byteLength at bytes 8..12
        let len_bytes: [u8; 4] = offset
            .checked_add(12)
            .and_then(|end| data.get(offset + 8..end))
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| StyleError::invalid_content(format!("cmpt: inner tile {i} truncated")))?;
        let inner_len = usize::try_from(u32::from_le_bytes(len_bytes))
            .map_err(|_| StyleError::invalid_content(format!("cmpt: inner tile {i} too large")))?;
        let tile = offset
            .checked_add(inner_len)
            .and_then(|end| data.get(offset..end))
            .filter(|t| t.len() >= 12)
            .ok_or_else(|| {
                StyleError::invalid_content(format!("cmpt: inner tile {i} overruns payload"))
            })?;

        inner.push(decode_content(tile)?);
        offset += inner_len;
    }

    log::debug!("decoded cmpt with {} inner tiles", inner.len());
    Ok(TileContent::Composite(inner))
}

/// Decode any supported tile payload by its magic bytes.
pub fn decode_content(data: &[u8]) -> StyleResult<TileContent> {
    let magic = data
        .get(..4)
        .ok_or_else(|| StyleError::invalid_content("payload too small for magic"))?;

    match magic {
        b"b3dm" => decode_b3dm(data).map(TileContent::Batched),
        b"pnts" => decode_pnts(data).map(TileContent::Batched),
        b"i3dm" => decode_i3dm(data).map(TileContent::Batched),
        b"cmpt" => decode_cmpt(data),
        other => Err(StyleError::unsupported(format!(
            "tile format {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// Load and decode a tile payload from path
pub fn load_content<P: AsRef<Path>>(path: P) -> StyleResult<TileContent> {
    let data = std::fs::read(path)?;
    decode_content(&data)
}
