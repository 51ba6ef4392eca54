use serde_json::Value;
use std::io;

use super::{primary_rows, result_of, row_cells, union_headers};

/// Write output as CSV to stdout. Row-shaped results (scored records,
/// trend points, bands, weights) become one line per row; anything else is
/// written as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = result_of(value);

    match (primary_rows(result), result) {
        (Some((_, rows)), _) => write_array_csv(&mut wtr, rows),
        (None, Value::Object(map)) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
        }
        (None, Value::Array(arr)) => write_array_csv(&mut wtr, arr),
        (None, other) => {
            let _ = wtr.write_record([&format_csv_value(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let headers = union_headers(arr);
    if headers.is_empty() {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
        return;
    }

    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let _ = wtr.write_record(row_cells(map, &headers, format_csv_value));
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
