//! PNTS (Point Cloud) payload decoding

use super::b3dm::{read_header, B3dmHeader};
use super::batch_table::{
    build_feature_batch, check_feature_count, feature_table_count, read_tables,
};
use super::feature::FeatureBatch;
use crate::error::{StyleError, StyleResult};

/// Decode the features of a PNTS payload.
///
/// Points are grouped into features by `BATCH_ID` when the feature table
/// declares a `BATCH_LENGTH`; otherwise every point is its own feature.
pub fn decode_pnts(data: &[u8]) -> StyleResult<FeatureBatch> {
    let header = read_header(data, b"pnts")?;
    let tables = read_tables(data, B3dmHeader::SIZE, header.table_lengths(), "pnts")?;

    let points_length = feature_table_count(&tables.feature_table, "POINTS_LENGTH")?
        .ok_or_else(|| StyleError::invalid_content("pnts: feature table has no POINTS_LENGTH"))?;
    let batch_length = feature_table_count(&tables.feature_table, "BATCH_LENGTH")?;
    let length = check_feature_count(batch_length.unwrap_or(points_length), data.len(), "pnts")?;

    let batch =
        build_feature_batch(length, tables.batch_table.as_ref(), tables.batch_table_binary)?;
    log::debug!(
        "decoded pnts with {} points in {} features",
        points_length,
        batch.len()
    );
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::super::b3dm::test_util::batched_payload;
    use super::*;

    #[test]
    fn test_points_are_features_without_batch_length() {
        let data = batched_payload(
            b"pnts",
            r#"{"POINTS_LENGTH":4,"POSITION":{"byteOffset":0}}"#,
            r#"{"intensity":[1,2,3,4]}"#,
        );
        let batch = decode_pnts(&data).unwrap();
        assert_eq!(batch.len(), 4);
    }

    #[test]
    fn test_batch_length_groups_points() {
        let data = batched_payload(
            b"pnts",
            r#"{"POINTS_LENGTH":100,"BATCH_LENGTH":2}"#,
            r#"{"classification":["ground","tree"]}"#,
        );
        assert_eq!(decode_pnts(&data).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_points_length() {
        let data = batched_payload(b"pnts", r#"{"BATCH_LENGTH":2}"#, "");
        assert!(decode_pnts(&data).is_err());
    }

    #[test]
    fn test_oversized_counts_are_rejected() {
        let data = batched_payload(b"pnts", r#"{"POINTS_LENGTH":18446744073709551615}"#, "");
        assert!(matches!(decode_pnts(&data), Err(StyleError::InvalidContent(_))));

        let data = batched_payload(
            b"pnts",
            r#"{"POINTS_LENGTH":4,"BATCH_LENGTH":4611686018427387904}"#,
            "",
        );
        assert!(decode_pnts(&data).is_err());
    }
}
