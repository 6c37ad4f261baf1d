//! B3DM (Batched 3D Model) payload decoding
//!
//! Only the header and the feature/batch tables are read; the embedded glTF is
//! the render primitive's business.

use bytemuck::{Pod, Zeroable};

use super::batch_table::{
    build_feature_batch, check_feature_count, feature_table_count, read_tables, TableLengths,
};
use super::feature::FeatureBatch;
use crate::error::{StyleError, StyleResult};

/// B3DM file header (28 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct B3dmHeader {
    /// Magic bytes "b3dm"
    pub magic: [u8; 4],
    /// Version (should be 1)
    pub version: u32,
    /// Total byte length of the file
    pub byte_length: u32,
    /// Feature table JSON byte length
    pub feature_table_json_byte_length: u32,
    /// Feature table binary byte length
    pub feature_table_binary_byte_length: u32,
    /// Batch table JSON byte length
    pub batch_table_json_byte_length: u32,
    /// Batch table binary byte length
    pub batch_table_binary_byte_length: u32,
}

impl B3dmHeader {
    pub const SIZE: usize = 28;

    pub(crate) fn table_lengths(&self) -> TableLengths {
        TableLengths {
            feature_table_json: self.feature_table_json_byte_length,
            feature_table_binary: self.feature_table_binary_byte_length,
            batch_table_json: self.batch_table_json_byte_length,
            batch_table_binary: self.batch_table_binary_byte_length,
        }
    }
}

/// Read and validate a 28-byte batched header (`b3dm` and `pnts` share the layout).
pub(crate) fn read_header(data: &[u8], magic: &[u8; 4]) -> StyleResult<B3dmHeader> {
    let format = String::from_utf8_lossy(magic);
    if data.len() < B3dmHeader::SIZE {
        return Err(StyleError::invalid_content(format!("{format}: file too small for header")));
    }

    let header: B3dmHeader = bytemuck::pod_read_unaligned(&data[..B3dmHeader::SIZE]);

    if &header.magic != magic {
        return Err(StyleError::invalid_content(format!(
            "{format}: invalid magic {:?}",
            header.magic
        )));
    }
    if header.version != 1 {
        return Err(StyleError::unsupported(format!(
            "{format} version {}",
            header.version
        )));
    }
    Ok(header)
}

/// Decode the features of a B3DM payload
pub fn decode_b3dm(data: &[u8]) -> StyleResult<FeatureBatch> {
    let header = read_header(data, b"b3dm")?;
    let tables = read_tables(data, B3dmHeader::SIZE, header.table_lengths(), "b3dm")?;

    let length = feature_table_count(&tables.feature_table, "BATCH_LENGTH")?
        .ok_or_else(|| StyleError::invalid_content("b3dm: feature table has no BATCH_LENGTH"))?;
    let length = check_feature_count(length, data.len(), "b3dm")?;

    let batch =
        build_feature_batch(length, tables.batch_table.as_ref(), tables.batch_table_binary)?;
    log::debug!("decoded b3dm with {} features", batch.len());
    Ok(batch)
}


#[cfg(test)]
mod tests {
    use super::test_util::batched_payload;
    use super::*;

    #[test]
    fn test_decode_b3dm_batch_table() {
        let data = batched_payload(
            b"b3dm",
            r#"{"BATCH_LENGTH":2}"#,
            r#"{"height":[5.0,25.0],"id":["x","y"]}"#,
        );
        let batch = decode_b3dm(&data).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.feature(1).unwrap().property("id").and_then(|v| v.as_str()),
            Some("y")
        );
    }

    #[test]
    fn test_decode_b3dm_rejects_bad_input() {
        assert!(decode_b3dm(b"b3dm").is_err());

        let mut data = batched_payload(b"b3dm", r#"{"BATCH_LENGTH":0}"#, "");
        data[0] = b'x';
        assert!(decode_b3dm(&data).is_err());

        let data = batched_payload(b"b3dm", r#"{}"#, "");
        assert!(matches!(decode_b3dm(&data), Err(StyleError::InvalidContent(_))));
    }

    #[test]
    fn test_decode_b3dm_unaligned_input() {
        let data = batched_payload(b"b3dm", r#"{"BATCH_LENGTH":3}"#, "");
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&data);
        assert_eq!(decode_b3dm(&shifted[1..]).unwrap().len(), 3);
    }

    #[test]
    fn test_decode_b3dm_rejects_oversized_batch_length() {
        let data = batched_payload(b"b3dm", r#"{"BATCH_LENGTH":4611686018427387904}"#, "");
        assert!(matches!(decode_b3dm(&data), Err(StyleError::InvalidContent(_))));

        let data = batched_payload(b"b3dm", r#"{"BATCH_LENGTH":100000000}"#, "");
        assert!(decode_b3dm(&data).is_err());
    }
}
