//! Mapping of source records onto destination points.

use serde_json::{json, Value};
use std::collections::HashMap;

use crate::connectors::{Point, Record};
use crate::error::{Error, Result};

/// Metadata key promoted to a top-level payload field.
pub const TEXT_FIELD: &str = "text";

/// Returns the integer form of `id` if it is purely ASCII digits and fits a `u64`.
pub fn numeric_id(id: &str) -> Option<u64> {
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

/// Chooses the destination id for a record.
///
/// Numeric ids are kept as integers. Anything else gets its global position
/// in the enumeration, `offset + position`.
pub fn point_id(id: &str, offset: usize, position: usize) -> u64 {
    numeric_id(id).unwrap_or((offset + position) as u64)
}

/// Builds the payload for a record's metadata.
///
/// With a `text` entry the payload is `{"text": .., "metadata": {..}}`, keeping
/// the full metadata next to the promoted field; otherwise it is the metadata
/// object itself.
pub fn payload_for(metadata: &serde_json::Map<String, Value>) -> Value {
    match metadata.get(TEXT_FIELD) {
        Some(text) => json!({
            TEXT_FIELD: text,
            "metadata": metadata,
        }),
        None => Value::Object(metadata.clone()),
    }
}

/// Converts one record, checking its vector length.
pub fn to_point(record: &Record, offset: usize, position: usize, dimension: usize) -> Result<Point> {
    if record.vector.len() != dimension {
        return Err(Error::DimensionMismatch {
            id: record.id.clone(),
            expected: dimension,
            actual: record.vector.len(),
        });
    }

    Ok(Point {
        id: point_id(&record.id, offset, position),
        vector: record.vector.clone(),
        payload: payload_for(&record.metadata),
    })
}

/// Converts `(position, record)` pairs of one batch.
///
/// Fails with [`Error::DuplicatePointId`] when a synthetic id lands on a
/// numeric id of the same batch, or two numeric ids parse to one integer.
pub fn to_points(records: &[(usize, Record)], offset: usize, dimension: usize) -> Result<Vec<Point>> {
    let mut seen: HashMap<u64, &str> = HashMap::with_capacity(records.len());
    let mut points = Vec::with_capacity(records.len());

    for (position, record) in records {
        let point = to_point(record, offset, *position, dimension)?;
        if let Some(first) = seen.insert(point.id, &record.id) {
            return Err(Error::DuplicatePointId {
                point_id: point.id,
                first: first.to_string(),
                second: record.id.clone(),
            });
        }
        points.push(point);
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>, metadata: Value) -> Record {
        Record {
            id: id.to_string(),
            vector,
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn test_numeric_id() {
        assert_eq!(numeric_id("42"), Some(42));
        assert_eq!(numeric_id("007"), Some(7));
        assert_eq!(numeric_id(""), None);
        assert_eq!(numeric_id("-1"), None);
        assert_eq!(numeric_id("1.5"), None);
        assert_eq!(numeric_id("doc-1"), None);
        assert_eq!(numeric_id("99999999999999999999999"), None);
    }

    #[test]
    fn test_point_id_uses_global_position_for_non_numeric() {
        assert_eq!(point_id("17", 1000, 3), 17);
        assert_eq!(point_id("doc-a", 1000, 3), 1003);
        assert_eq!(point_id("doc-b", 0, 0), 0);
    }

    #[test]
    fn test_to_points_rejects_synthetic_id_collision() {
        let records = vec![
            (0, record("1", vec![0.0], json!({}))),
            (1, record("doc-x", vec![0.0], json!({}))),
        ];

        let err = to_points(&records, 0, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::DuplicatePointId { point_id: 1, ref first, ref second }
                if first == "1" && second == "doc-x"
        ));
    }

    #[test]
    fn test_to_points_rejects_equal_numeric_ids() {
        let records = vec![
            (0, record("7", vec![0.0], json!({}))),
            (1, record("007", vec![0.0], json!({}))),
        ];

        assert!(matches!(
            to_points(&records, 0, 1),
            Err(Error::DuplicatePointId { point_id: 7, .. })
        ));
    }

    #[test]
    fn test_payload_promotes_text() {
        let r = record("1", vec![0.0], json!({"text": "hello", "lang": "en"}));
        let payload = payload_for(&r.metadata);

        assert_eq!(payload["text"], "hello");
        assert_eq!(payload["metadata"]["text"], "hello");
        assert_eq!(payload["metadata"]["lang"], "en");
    }

    #[test]
    fn test_payload_without_text_is_metadata() {
        let r = record("1", vec![0.0], json!({"lang": "en"}));
        assert_eq!(payload_for(&r.metadata), json!({"lang": "en"}));
    }

    #[test]
    fn test_to_point_rejects_wrong_dimension() {
        let r = record("5", vec![0.1, 0.2, 0.3], json!({}));
        let err = to_point(&r, 0, 0, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 4,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_to_points_keeps_order() {
        let records = vec![
            (0, record("3", vec![1.0, 2.0], json!({"text": "a"}))),
            (2, record("x", vec![3.0, 4.0], json!({}))),
        ];
        let points = to_points(&records, 10, 2).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, 3);
        assert_eq!(points[1].id, 12);
        assert_eq!(points[1].vector, vec![3.0, 4.0]);
    }
}
