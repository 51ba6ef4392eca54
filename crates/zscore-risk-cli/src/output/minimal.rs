use serde_json::Value;

use super::result_of;

/// Print just the key answer value from the output.
///
/// Batch output prints one `ticker/year zone` line per scored record.
/// Otherwise the first well-known field present wins, falling back to the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = result_of(value);

    if let Some(Value::Array(scored)) = result_obj.get("scored") {
        for record in scored {
            println!(
                "{}/{} {}",
                field(record, "tic"),
                field(record, "fyear"),
                field(record, "risk_zone")
            );
        }
        return;
    }

    let priority_keys = ["risk_zone", "latest_zone", "lda_probability", "z_score", "summary"];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn field(record: &Value, key: &str) -> String {
    record.get(key).map(format_minimal).unwrap_or_default()
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
