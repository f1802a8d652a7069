//! Flat key/value save records
//!
//! Every stateful component exposes `save_data()` and `load_save_data()`.
//! Records are plain numbers, flags and bounded arrays. Missing fields fall
//! back to their defaults; a field of the wrong type rejects the whole load.

use crate::error::DamageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Flat key/value structure handed to the persistence layer
pub type SaveData = serde_json::Map<String, Value>;

/// Serialize a save record into a flat map
pub fn to_save_data<T: Serialize>(record: &T) -> SaveData {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!("Save record serialized to a non-object value: {}", other);
            SaveData::new()
        }
        Err(e) => {
            tracing::warn!("Failed to serialize save record: {}", e);
            SaveData::new()
        }
    }
}

/// Deserialize a save record, defaulting any missing field
pub fn from_save_data<T: DeserializeOwned>(data: &SaveData) -> Result<T, DamageError> {
    serde_json::from_value(Value::Object(data.clone()))
        .map_err(|e| DamageError::MalformedSave(e.to_string()))
}

/// Read a nested record stored under `key` (empty when absent)
pub fn nested(data: &SaveData, key: &str) -> SaveData {
    match data.get(key) {
        Some(Value::Object(map)) => map.clone(),
        _ => SaveData::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        current: f64,
        history: Vec<f64>,
        flag: bool,
    }

    #[test]
    fn test_missing_fields_default() {
        let mut data = SaveData::new();
        data.insert("current".to_string(), Value::from(12.5));

        let sample: Sample = from_save_data(&data).unwrap();
        assert!((sample.current - 12.5).abs() < f64::EPSILON);
        assert!(sample.history.is_empty());
        assert!(!sample.flag);
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let mut data = SaveData::new();
        data.insert("current".to_string(), Value::from("twelve"));

        let result: Result<Sample, _> = from_save_data(&data);
        assert!(matches!(result, Err(DamageError::MalformedSave(_))));
    }

    #[test]
    fn test_round_trip() {
        let sample = Sample {
            current: 3.0,
            history: vec![1.0, 2.0],
            flag: true,
        };
        let data = to_save_data(&sample);
        let loaded: Sample = from_save_data(&data).unwrap();
        assert_eq!(sample, loaded);
    }

    #[test]
    fn test_nested_missing_is_empty() {
        let data = SaveData::new();
        assert!(nested(&data, "shields").is_empty());
    }
}
