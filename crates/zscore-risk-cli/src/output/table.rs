use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{primary_rows, result_of, row_cells, union_headers};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    let result = result_of(value);

    match primary_rows(result) {
        Some((key, rows)) => {
            print_array_table(rows);
            if let Value::Object(map) = result {
                print_secondary(map, key);
            }
        }
        None => match result {
            Value::Object(map) => print_flat_object(map),
            Value::Array(arr) => print_array_table(arr),
            other => println!("{}", format_value(other)),
        },
    }

    if let Value::Object(envelope) = value {
        print_envelope_notes(envelope);
    }
}

/// Everything in the result besides the main row set: batch failures and
/// summary, trend statistics.
fn print_secondary(result: &Map<String, Value>, rows_key: &str) {
    let rest: Map<String, Value> = result
        .iter()
        .filter(|(k, _)| k.as_str() != rows_key && k.as_str() != "failures")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Some(Value::Array(failures)) = result.get("failures") {
        if !failures.is_empty() {
            println!("\nFailed records:");
            print_array_table(failures);
        }
    }

    if !rest.is_empty() {
        println!();
        print_flat_object(&rest);
    }
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(breakdown) = envelope.get("z_score_breakdown") {
        if let Some(Value::Array(components)) = breakdown.get("components") {
            println!("\nZ-Score breakdown:");
            print_array_table(components);
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    let headers = union_headers(arr);
    if headers.is_empty() {
        for item in arr {
            println!("{}", format_value(item));
        }
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            builder.push_record(row_cells(map, &headers, format_value));
        }
    }
    println!("{}", Table::from(builder));
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
