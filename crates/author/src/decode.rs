//! Validation of persisted object lists.
//!
//! Entries come from backends we do not control. Each one is checked on its
//! own so a single bad entry never sinks the whole list.

use propyard_assets::AssetCatalog;
use propyard_common::{ObjectId, PlacedObject};
use serde_json::Value;
use std::collections::BTreeSet;

/// Why an entry (or the whole payload) was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not a list")]
    NotAList,
    #[error("entry is not an object")]
    NotAnObject,
    #[error("missing or non-string field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` needs at least 3 finite numbers")]
    InvalidVector(&'static str),
    #[error("unknown asset `{0}`")]
    UnknownAsset(String),
    #[error("duplicate id `{0}`")]
    DuplicateId(String),
}

/// An entry that was left out of a load.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub index: usize,
    pub error: DecodeError,
}

/// Decode one entry. Extra vector components and unknown fields are ignored.
pub fn decode_entry(value: &Value, catalog: &AssetCatalog) -> Result<PlacedObject, DecodeError> {
    let map = value.as_object().ok_or(DecodeError::NotAnObject)?;
    let text = |field: &'static str| {
        map.get(field)
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingField(field))
    };
    let id = text("id")?;
    let asset_id = text("assetId")?;
    let position = vector(map.get("position"), "position")?;
    let rotation = vector(map.get("rotation"), "rotation")?;
    if !catalog.contains(asset_id) {
        return Err(DecodeError::UnknownAsset(asset_id.to_owned()));
    }
    Ok(PlacedObject {
        id: ObjectId::from(id),
        asset_id: asset_id.to_owned(),
        position,
        rotation,
    })
}

fn vector(value: Option<&Value>, field: &'static str) -> Result<[f32; 3], DecodeError> {
    let items = value
        .and_then(Value::as_array)
        .filter(|a| a.len() >= 3)
        .ok_or(DecodeError::InvalidVector(field))?;
    let mut out = [0.0; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        let v = item
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or(DecodeError::InvalidVector(field))?;
        *slot = v as f32;
    }
    Ok(out)
}

/// Decode a whole list. Fails only when `value` is not a list; bad entries
/// are returned as skipped, in order. Later duplicates of an id are skipped.
pub fn decode_list(
    value: &Value,
    catalog: &AssetCatalog,
) -> Result<(Vec<PlacedObject>, Vec<SkippedEntry>), DecodeError> {
    let items = value.as_array().ok_or(DecodeError::NotAList)?;
    let mut seen = BTreeSet::new();
    let mut objects = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let decoded = decode_entry(item, catalog).and_then(|object| {
            if seen.insert(object.id.clone()) {
                Ok(object)
            } else {
                Err(DecodeError::DuplicateId(object.id.to_string()))
            }
        });
        match decoded {
            Ok(object) => objects.push(object),
            Err(error) => skipped.push(SkippedEntry { index, error }),
        }
    }
    Ok((objects, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog() -> AssetCatalog {
        AssetCatalog::builtin()
    }

    #[test]
    fn valid_entry_decodes() {
        let v = json!({"id": "a", "assetId": "block", "position": [1, 2.5, 3], "rotation": [0, 1.5, 0, 9]});
        let object = decode_entry(&v, &catalog()).unwrap();
        assert_eq!(object.id.as_str(), "a");
        assert_eq!(object.position, [1.0, 2.5, 3.0]);
        assert_eq!(object.rotation, [0.0, 1.5, 0.0]);
    }

    #[test]
    fn short_or_non_numeric_vectors_are_rejected() {
        let c = catalog();
        let short = json!({"id": "a", "assetId": "block", "position": [1, 2], "rotation": [0, 0, 0]});
        assert_eq!(decode_entry(&short, &c), Err(DecodeError::InvalidVector("position")));
        let text = json!({"id": "a", "assetId": "block", "position": [1, 2, 3], "rotation": [0, "x", 0]});
        assert_eq!(decode_entry(&text, &c), Err(DecodeError::InvalidVector("rotation")));
        let missing = json!({"id": "a", "assetId": "block", "position": [1, 2, 3]});
        assert_eq!(decode_entry(&missing, &c), Err(DecodeError::InvalidVector("rotation")));
    }

    #[test]
    fn unknown_asset_and_missing_fields() {
        let c = catalog();
        let v = json!({"id": "a", "assetId": "sofa", "position": [0, 0, 0], "rotation": [0, 0, 0]});
        assert_eq!(decode_entry(&v, &c), Err(DecodeError::UnknownAsset("sofa".into())));
        let v = json!({"assetId": "block", "position": [0, 0, 0], "rotation": [0, 0, 0]});
        assert_eq!(decode_entry(&v, &c), Err(DecodeError::MissingField("id")));
        assert_eq!(decode_entry(&json!(7), &c), Err(DecodeError::NotAnObject));
    }

    #[test]
    fn list_skips_bad_entries_individually() {
        let v = json!([
            {"id": "a", "assetId": "block", "position": [0, 2.5, 0], "rotation": [0, 0, 0]},
            "junk",
            {"id": "b", "assetId": "nope", "position": [0, 0, 0], "rotation": [0, 0, 0]},
            {"id": "a", "assetId": "slab", "position": [5, 0.5, 0], "rotation": [0, 0, 0]},
            {"id": "c", "assetId": "crate", "position": [5, 1, 5], "rotation": [0, 0, 0]}
        ]);
        let (objects, skipped) = decode_list(&v, &catalog()).unwrap();
        let ids: Vec<&str> = objects.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        let indices: Vec<usize> = skipped.iter().map(|s| s.index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(skipped[2].error, DecodeError::DuplicateId("a".into()));
    }

    #[test]
    fn non_list_payload_is_rejected() {
        assert_eq!(
            decode_list(&json!({"objects": []}), &catalog()),
            Err(DecodeError::NotAList)
        );
    }
}
