use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{self, Read};

/// Piped input: JSON when it starts with `{` or `[`, otherwise CSV with a
/// header row.
pub enum StdinPayload {
    Json(Value),
    Csv(Vec<BTreeMap<String, String>>),
}

/// Attempt to read piped data from stdin.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<StdinPayload>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_payload(&buffer)
}

fn parse_payload(buffer: &str) -> Result<Option<StdinPayload>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed)?;
        return Ok(Some(StdinPayload::Json(value)));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(trimmed.as_bytes());
    let rows = reader
        .deserialize::<BTreeMap<String, String>>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("Failed to parse CSV from stdin: {}", e))?;
    Ok(Some(StdinPayload::Csv(rows)))
}
