//! I3DM (Instanced 3D Model) payload decoding

use bytemuck::{Pod, Zeroable};

use super::batch_table::{
    build_feature_batch, check_feature_count, feature_table_count, read_tables, TableLengths,
};
use super::feature::FeatureBatch;
use crate::error::{StyleError, StyleResult};

/// I3DM file header (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct I3dmHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub byte_length: u32,
    pub feature_table_json_byte_length: u32,
    pub feature_table_binary_byte_length: u32,
    pub batch_table_json_byte_length: u32,
    pub batch_table_binary_byte_length: u32,
    /// 0 = glTF referenced by URI, 1 = embedded binary glTF
    pub gltf_format: u32,
}

impl I3dmHeader {
    pub const SIZE: usize = 32;
}

/// Decode the features of an I3DM payload; each instance is one feature.
pub fn decode_i3dm(data: &[u8]) -> StyleResult<FeatureBatch> {
    if data.len() < I3dmHeader::SIZE {
        return Err(StyleError::invalid_content("i3dm: file too small for header"));
    }
    let header: I3dmHeader = bytemuck::pod_read_unaligned(&data[..I3dmHeader::SIZE]);
    if &header.magic != b"i3dm" {
        return Err(StyleError::invalid_content(format!(
            "i3dm: invalid magic {:?}",
            header.magic
        )));
    }
    if header.version != 1 {
        return Err(StyleError::unsupported(format!("i3dm version {}", header.version)));
    }

    let lengths = TableLengths {
        feature_table_json: header.feature_table_json_byte_length,
        feature_table_binary: header.feature_table_binary_byte_length,
        batch_table_json: header.batch_table_json_byte_length,
        batch_table_binary: header.batch_table_binary_byte_length,
    };
    let tables = read_tables(data, I3dmHeader::SIZE, lengths, "i3dm")?;

    let length = feature_table_count(&tables.feature_table, "INSTANCES_LENGTH")?
        .ok_or_else(|| StyleError::invalid_content("i3dm: feature table has no INSTANCES_LENGTH"))?;
    let length = check_feature_count(length, data.len(), "i3dm")?;

    let batch =
        build_feature_batch(length, tables.batch_table.as_ref(), tables.batch_table_binary)?;
    log::debug!("decoded i3dm with {} instances", batch.len());
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instanced_payload(feature_table: &[u8]) -> Vec<u8> {
        let total = I3dmHeader::SIZE + feature_table.len();
        let mut data = b"i3dm".to_vec();
        for v in [1u32, total as u32, feature_table.len() as u32, 0, 0, 0, 1] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(feature_table);
        data
    }

    #[test]
    fn test_decode_i3dm_instances() {
        let data = instanced_payload(br#"{"INSTANCES_LENGTH":3}    "#);

        let batch = decode_i3dm(&data).unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.property_names().next().is_none());
    }

    #[test]
    fn test_decode_i3dm_rejects_oversized_instance_count() {
        let data = instanced_payload(br#"{"INSTANCES_LENGTH":4294967296}"#);
        assert!(matches!(decode_i3dm(&data), Err(StyleError::InvalidContent(_))));
    }
}
