//! Typed boundary for the upstream bibliographic export
//!
//! The export parser itself is out of scope; this module only decodes
//! the already-parsed JSON shapes that exports arrive in (a bare array,
//! an `{"items": [...]}` wrapper, or a single object, with the DOI
//! nested under `data` or at the top level) into [`ExportRecord`]s.
//! Anything else is a schema error at the boundary.

use citegraph_common::errors::{PipelineError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// One input record from the bibliographic export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRecord {
    /// Raw DOI string, pre-normalization
    pub doi: Option<String>,

    /// Provider-native identifier, used when no DOI is present
    pub provider_id: Option<String>,
}

/// Load export records from a JSON file
pub fn load_export(path: &Path) -> Result<Vec<ExportRecord>> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw)?;
    records_from_value(value)
}

fn records_from_value(value: Value) -> Result<Vec<ExportRecord>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(PipelineError::Schema {
                    message: format!("export 'items' is not an array: {other}"),
                })
            }
            // A lone object is treated as a single-record export
            None => vec![Value::Object(obj)],
        },
        other => {
            return Err(PipelineError::Schema {
                message: format!("unexpected export JSON structure: {other}"),
            })
        }
    };

    Ok(items.iter().map(record_from_item).collect())
}

fn record_from_item(item: &Value) -> ExportRecord {
    // Some exports nest metadata under "data"
    let inner = match item.get("data") {
        Some(data @ Value::Object(_)) => data,
        _ => item,
    };
    let doi = field_string(inner, "DOI").or_else(|| field_string(inner, "doi"));
    let provider_id = field_string(inner, "id").or_else(|| field_string(inner, "key"));
    ExportRecord { doi, provider_id }
}

fn field_string(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array_export() {
        let records = records_from_value(serde_json::json!([
            {"DOI": "10.1/a"},
            {"doi": "10.1/b"}
        ]))
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].doi.as_deref(), Some("10.1/a"));
        assert_eq!(records[1].doi.as_deref(), Some("10.1/b"));
    }

    #[test]
    fn test_items_wrapper_and_data_nesting() {
        let records = records_from_value(serde_json::json!({
            "items": [
                {"data": {"DOI": "10.1/a", "key": "ABCD"}},
                {"key": "EFGH"}
            ]
        }))
        .unwrap();
        assert_eq!(records[0].doi.as_deref(), Some("10.1/a"));
        assert_eq!(records[0].provider_id.as_deref(), Some("ABCD"));
        assert_eq!(records[1].doi, None);
        assert_eq!(records[1].provider_id.as_deref(), Some("EFGH"));
    }

    #[test]
    fn test_single_object_export() {
        let records = records_from_value(serde_json::json!({"DOI": "10.1/a"})).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].doi.as_deref(), Some("10.1/a"));
    }

    #[test]
    fn test_non_object_export_is_schema_error() {
        let err = records_from_value(serde_json::json!("just a string")).unwrap_err();
        assert!(matches!(err, PipelineError::Schema { .. }));
    }

    #[test]
    fn test_blank_fields_are_dropped() {
        let records = records_from_value(serde_json::json!([{"DOI": "  "}])).unwrap();
        assert_eq!(records[0].doi, None);
    }
}
