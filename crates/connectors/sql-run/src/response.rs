//! The reply sent back to the orchestrator.

use query_engine_execution::StatementResult;
use serde::{Deserialize, Serialize};

use crate::event::LifecycleEvent;

/// Flattened response data: dot-joined paths to scalar values.
pub type ResponseData = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseEnvelope {
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: ResponseData,
    pub no_echo: bool,
}

impl ResponseEnvelope {
    /// The reply to `event`. Creates get a fresh physical resource id; other events
    /// keep the one they refer to.
    pub fn build(event: &LifecycleEvent, results: &[StatementResult]) -> ResponseEnvelope {
        let common = event.common();
        let physical_resource_id = event
            .physical_resource_id()
            .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);
        ResponseEnvelope {
            physical_resource_id,
            stack_id: common.stack_id.clone(),
            request_id: common.request_id.clone(),
            logical_resource_id: common.logical_resource_id.clone(),
            data: flatten_results(results),
            no_echo: false,
        }
    }
}

/// Flatten per-statement rows into `statement.row.column[.nested...]` keys.
pub fn flatten_results(results: &[StatementResult]) -> ResponseData {
    let mut data = ResponseData::new();
    let mut path = vec![];
    for (statement_index, rows) in results.iter().enumerate() {
        path.push(statement_index.to_string());
        for (row_index, row) in rows.iter().enumerate() {
            path.push(row_index.to_string());
            for (column, value) in row {
                path.push(column.clone());
                flatten(value, &mut path, &mut data);
                path.pop();
            }
            path.pop();
        }
        path.pop();
    }
    data
}

/// Flatten any JSON value under `path`. Scalars, null included, become leaves.
pub fn flatten(value: &serde_json::Value, path: &mut Vec<String>, data: &mut ResponseData) {
    match value {
        serde_json::Value::Object(object) => {
            for (key, child) in object {
                path.push(key.clone());
                flatten(child, path, data);
                path.pop();
            }
        }
        serde_json::Value::Array(array) => {
            for (index, child) in array.iter().enumerate() {
                path.push(index.to_string());
                flatten(child, path, data);
                path.pop();
            }
        }
        scalar => {
            data.insert(path.join("."), scalar.clone());
        }
    }
}
