//! Feature table / batch table sections shared by the batched payload formats

use serde_json::Value;

use super::feature::{FeatureBatch, PropertyValue};
use crate::error::{StyleError, StyleResult};

/// Byte lengths of the four table sections that follow a payload header
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableLengths {
    pub feature_table_json: u32,
    pub feature_table_binary: u32,
    pub batch_table_json: u32,
    pub batch_table_binary: u32,
}

/// Parsed table sections of a payload
#[derive(Debug)]
pub(crate) struct Tables<'a> {
    pub feature_table: Value,
    pub batch_table: Option<Value>,
    pub batch_table_binary: &'a [u8],
}

/// Read the feature and batch tables that start at `offset`.
pub(crate) fn read_tables<'a>(
    data: &'a [u8],
    offset: usize,
    lengths: TableLengths,
    format: &str,
) -> StyleResult<Tables<'a>> {
    let mut offset = offset;

    let ft_json = take(data, &mut offset, lengths.feature_table_json, format, "feature table")?;
    let feature_table = if ft_json.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        parse_json_section(ft_json, format, "feature table")?
    };

    take(data, &mut offset, lengths.feature_table_binary, format, "feature table binary")?;

    let bt_json = take(data, &mut offset, lengths.batch_table_json, format, "batch table")?;
    let batch_table = if bt_json.is_empty() {
        None
    } else {
        Some(parse_json_section(bt_json, format, "batch table")?)
    };

    let batch_table_binary =
        take(data, &mut offset, lengths.batch_table_binary, format, "batch table binary")?;

    Ok(Tables {
        feature_table,
        batch_table,
        batch_table_binary,
    })
}

fn take<'a>(
    data: &'a [u8],
    offset: &mut usize,
    len: u32,
    format: &str,
    section: &str,
) -> StyleResult<&'a [u8]> {
    let start = *offset;
    let end = start
        .checked_add(len as usize)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            StyleError::invalid_content(format!("{format}: {section} overruns payload"))
        })?;
    *offset = end;
    Ok(&data[start..end])
}

fn parse_json_section(bytes: &[u8], format: &str, section: &str) -> StyleResult<Value> {
    // Sections are padded with trailing spaces (and occasionally NULs) for alignment
    let json_str = std::str::from_utf8(bytes).map_err(|e| {
        StyleError::invalid_content(format!("{format}: invalid UTF-8 in {section}: {e}"))
    })?;
    Ok(serde_json::from_str(json_str.trim_end_matches(['\0', ' ']))?)
}

/// Read an integer global such as `BATCH_LENGTH` from a feature table.
pub(crate) fn feature_table_count(
    feature_table: &Value,
    key: &str,
) -> StyleResult<Option<usize>> {
    let Some(value) = feature_table.get(key) else {
        return Ok(None);
    };
    value
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| {
            StyleError::invalid_content(format!("{key} must be a non-negative integer"))
        })
}

/// Reject a feature count the payload cannot hold.
///
/// Every feature occupies at least one byte of its payload (a batch id, a
/// position or a batch table entry), so a count above the payload length is
/// corrupt and must not drive allocation.
pub(crate) fn check_feature_count(
    length: usize,
    payload_len: usize,
    format: &str,
) -> StyleResult<usize> {
    if length > payload_len {
        return Err(StyleError::invalid_content(format!(
            "{format}: {length} features cannot fit in a {payload_len} byte payload"
        )));
    }
    Ok(length)
}

/// Build a feature batch of `length` features from a batch table.
///
/// JSON array columns map element-wise to features; binary columns are read
/// from `binary` when they are `SCALAR`. Vector-typed binary columns cannot be
/// binned and are skipped.
pub(crate) fn build_feature_batch(
    length: usize,
    batch_table: Option<&Value>,
    binary: &[u8],
) -> StyleResult<FeatureBatch> {
    let mut batch = FeatureBatch::new(length);

    let Some(table) = batch_table else {
        return Ok(batch);
    };
    let table = table
        .as_object()
        .ok_or_else(|| StyleError::invalid_content("batch table must be a JSON object"))?;

    for (name, column) in table {
        if name == "extensions" || name == "extras" {
            continue;
        }
        match column {
            Value::Array(values) => {
                let column = values.iter().map(PropertyValue::from_json).collect();
                batch.insert_column(name, column);
            }
            Value::Object(reference) => match read_binary_column(reference, length, binary)? {
                Some(column) => batch.insert_column(name, column),
                None => log::warn!("skipping non-scalar batch table property {name:?}"),
            },
            _ => {
                return Err(StyleError::invalid_content(format!(
                    "batch table property {name:?} is neither an array nor a binary reference"
                )))
            }
        }
    }

    Ok(batch)
}

fn read_binary_column(
    reference: &serde_json::Map<String, Value>,
    length: usize,
    binary: &[u8],
) -> StyleResult<Option<Vec<Option<PropertyValue>>>> {
    let byte_offset = reference.get("byteOffset").and_then(Value::as_u64).unwrap_or(0) as usize;
    let component_type = reference
        .get("componentType")
        .and_then(Value::as_str)
        .ok_or_else(|| StyleError::invalid_content("binary property without componentType"))?;
    let ty = reference.get("type").and_then(Value::as_str).unwrap_or("SCALAR");

    if ty != "SCALAR" {
        return Ok(None);
    }

    let size = component_size(component_type)?;
    let end = length
        .checked_mul(size)
        .and_then(|n| n.checked_add(byte_offset))
        .filter(|&end| end <= binary.len())
        .ok_or_else(|| StyleError::invalid_content("binary batch table property overruns buffer"))?;

    let column = binary[byte_offset..end]
        .chunks_exact(size)
        .map(|bytes| Some(PropertyValue::Number(read_component(component_type, bytes))))
        .collect();
    Ok(Some(column))
}

fn component_size(component_type: &str) -> StyleResult<usize> {
    match component_type {
        "BYTE" | "UNSIGNED_BYTE" => Ok(1),
        "SHORT" | "UNSIGNED_SHORT" => Ok(2),
        "INT" | "UNSIGNED_INT" | "FLOAT" => Ok(4),
        "DOUBLE" => Ok(8),
        other => Err(StyleError::unsupported(format!("component type {other}"))),
    }
}

fn read_component(component_type: &str, b: &[u8]) -> f64 {
    match component_type {
        "BYTE" => f64::from(b[0] as i8),
        "UNSIGNED_BYTE" => f64::from(b[0]),
        "SHORT" => f64::from(i16::from_le_bytes([b[0], b[1]])),
        "UNSIGNED_SHORT" => f64::from(u16::from_le_bytes([b[0], b[1]])),
        "INT" => f64::from(i32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        "UNSIGNED_INT" => f64::from(u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        "FLOAT" => f64::from(f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        _ => f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_columns() {
        let table = serde_json::json!({
            "height": [10.5, 20.0, 31.0],
            "name": ["a", "b", null],
            "extras": { "note": "ignored" }
        });
        let batch = build_feature_batch(3, Some(&table), &[]).unwrap();
        assert_eq!(batch.len(), 3);

        let f = batch.feature(2).unwrap();
        assert_eq!(f.property("height"), Some(&PropertyValue::Number(31.0)));
        assert_eq!(f.property("name"), None);
        assert!(batch.property_names().all(|n| n != "extras"));
    }

    #[test]
    fn test_binary_scalar_column() {
        let mut binary = Vec::new();
        for v in [1.5f32, -2.0, 8.25] {
            binary.extend_from_slice(&v.to_le_bytes());
        }
        let table = serde_json::json!({
            "height": { "byteOffset": 0, "componentType": "FLOAT", "type": "SCALAR" },
            "normal": { "byteOffset": 0, "componentType": "FLOAT", "type": "VEC3" }
        });
        let batch = build_feature_batch(3, Some(&table), &binary).unwrap();
        let heights: Vec<f64> = (0..3)
            .map(|i| batch.feature(i).unwrap().property("height").unwrap().as_number())
            .collect();
        assert_eq!(heights, vec![1.5, -2.0, 8.25]);
        assert!(!batch.feature(0).unwrap().has_property("normal"));
    }

    #[test]
    fn test_binary_overrun_is_an_error() {
        let table = serde_json::json!({
            "id": { "byteOffset": 4, "componentType": "UNSIGNED_INT" }
        });
        assert!(build_feature_batch(2, Some(&table), &[0u8; 8]).is_err());
    }

    #[test]
    fn test_feature_table_count() {
        let ft = serde_json::json!({ "BATCH_LENGTH": 4, "BAD": -1 });
        assert_eq!(feature_table_count(&ft, "BATCH_LENGTH").unwrap(), Some(4));
        assert_eq!(feature_table_count(&ft, "POINTS_LENGTH").unwrap(), None);
        assert!(feature_table_count(&ft, "BAD").is_err());
    }

    #[test]
    fn test_feature_count_bounded_by_payload() {
        assert_eq!(check_feature_count(64, 64, "b3dm").unwrap(), 64);
        assert!(matches!(
            check_feature_count(65, 64, "b3dm"),
            Err(StyleError::InvalidContent(_))
        ));
        assert!(check_feature_count(usize::MAX, 60, "pnts").is_err());
    }
}
