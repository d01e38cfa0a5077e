//! Language instruction (`info.json`) loading.

use crate::models::{ConvertError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read the instruction string stored under `key`.
///
/// B_i(key present) → Result; a missing key has no default.
pub fn load_instruction(path: &Path, key: &str) -> Result<String> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConvertError::io(format!("reading {}", path.display()), e))?;

    let value: Value = serde_json::from_str(&content).map_err(|e| {
        ConvertError::InvalidInstruction {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let object = value.as_object().ok_or_else(|| ConvertError::InvalidInstruction {
        path: path.to_path_buf(),
        reason: "top-level value is not an object".to_string(),
    })?;

    match object.get(key) {
        Some(Value::String(text)) => Ok(text.clone()),
        Some(other) => Err(ConvertError::InvalidInstruction {
            path: path.to_path_buf(),
            reason: format!("'{key}' is not a string: {other}"),
        }),
        None => Err(ConvertError::MissingKey {
            path: path.to_path_buf(),
            key: key.to_string(),
        }),
    }
}

/// Read the instruction when the file exists, otherwise the empty string.
pub fn load_optional_instruction(path: &Path, key: &str) -> Result<String> {
    if path.exists() {
        load_instruction(path, key)
    } else {
        Ok(String::new())
    }
}
