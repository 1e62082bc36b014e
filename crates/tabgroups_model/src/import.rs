//! Shape detection for user-supplied import files.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::branch::{BranchStore, BranchStoreData};
use crate::error::{ModelError, ModelResult};
use crate::state::{TabsState, TabsStateData};

/// A successfully recognized import payload.
#[derive(Debug, Clone)]
pub enum ImportedData {
    State(TabsState),
    Branches(BranchStore),
}

fn is_state_shape(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("groups") || obj.contains_key("blackList"))
}

/// Decides which of the known transfer shapes `json` holds and decodes it.
///
/// - an object with `groups` and/or `blackList` is a single state;
/// - an object with `branches` is a branch store;
/// - a non-empty object whose every value is a state is a bare branch map.
///
/// Anything else is rejected as [`ModelError::UnrecognizedFormat`] rather than
/// coerced.
pub fn detect_import(json: &str) -> ModelResult<ImportedData> {
    let value: Value = serde_json::from_str(json)?;
    let Some(obj) = value.as_object() else {
        return Err(ModelError::UnrecognizedFormat(
            "expected a JSON object".to_string(),
        ));
    };

    if is_state_shape(&value) {
        let data: TabsStateData = serde_json::from_value(value)?;
        return Ok(ImportedData::State(TabsState::from_transfer(data)));
    }

    if obj.contains_key("branches") {
        let data: BranchStoreData = serde_json::from_value(value)?;
        return Ok(ImportedData::Branches(BranchStore::from_transfer(data)));
    }

    if !obj.is_empty() && obj.values().all(is_state_shape) {
        let branches: BTreeMap<String, TabsStateData> = serde_json::from_value(value)?;
        return Ok(ImportedData::Branches(BranchStore::from_transfer(
            BranchStoreData { branches },
        )));
    }

    let keys: Vec<&str> = obj.keys().map(String::as_str).take(5).collect();
    Err(ModelError::UnrecognizedFormat(format!(
        "no groups, blackList or branches key (found: [{}])",
        keys.join(", ")
    )))
}
