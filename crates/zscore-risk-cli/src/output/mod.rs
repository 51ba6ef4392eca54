pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Keys holding the row set of each command's result, in lookup order.
const ROW_KEYS: [&str; 6] = ["scored", "points", "bands", "weights", "companies", "industries"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The `result` object of an output envelope, or the value itself.
fn result_of(value: &Value) -> &Value {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
}

/// The first array of records inside a result object.
fn primary_rows(result: &Value) -> Option<(&'static str, &[Value])> {
    let map = result.as_object()?;
    ROW_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Array(rows)) => Some((*key, rows.as_slice())),
        _ => None,
    })
}

/// Column headers across every row, in first-seen order. Batch rows differ
/// in which optional fields they carry.
fn union_headers(rows: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

fn row_cells(
    row: &Map<String, Value>,
    headers: &[String],
    render: fn(&Value) -> String,
) -> Vec<String> {
    headers
        .iter()
        .map(|h| row.get(h.as_str()).map(render).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primary_rows_prefers_scored() {
        let result = json!({ "scored": [{"tic": "A"}], "failures": [] });
        let (key, rows) = primary_rows(&result).unwrap();
        assert_eq!(key, "scored");
        assert_eq!(rows.len(), 1);
        assert!(primary_rows(&json!({ "risk_zone": "High Risk" })).is_none());
    }

    #[test]
    fn test_union_headers_keeps_first_seen_order() {
        let rows = vec![
            json!({ "tic": "A", "X1": 0.1 }),
            json!({ "tic": "B", "X1": 0.2, "z_score": 1.0 }),
        ];
        assert_eq!(union_headers(&rows), vec!["tic", "X1", "z_score"]);
    }

    #[test]
    fn test_result_of_unwraps_envelope() {
        let value = json!({ "result": { "risk_zone": "High Risk" }, "warnings": [] });
        assert_eq!(result_of(&value), &json!({ "risk_zone": "High Risk" }));
    }
}
