use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a JSON file as a generic serde_json::Value.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a YAML file and deserialise into a typed struct.
pub fn read_yaml<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a CSV file with a header row into text rows keyed by column name.
pub fn read_csv_rows(
    path: &str,
) -> Result<Vec<BTreeMap<String, String>>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let mut rows = Vec::new();
    for (i, row) in reader.deserialize::<BTreeMap<String, String>>().enumerate() {
        let row = row.map_err(|e| {
            format!("Failed to parse '{}' at data row {}: {}", canonical.display(), i + 1, e)
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// True when the path names a CSV file.
pub fn is_csv(path: &str) -> bool {
    has_extension(path, &["csv"])
}

/// True when the path names a YAML file.
pub fn is_yaml(path: &str) -> bool {
    has_extension(path, &["yaml", "yml"])
}

fn has_extension(path: &str, extensions: &[&str]) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    // Basic existence check
    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_rows() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "tic,fyear,industry,X1").unwrap();
        writeln!(file, "AAA, 2019 ,Tech,0.2").unwrap();
        writeln!(file, "BBB,2020,,").unwrap();
        let path = file.path().to_str().unwrap();

        assert!(is_csv(path));
        let rows = read_csv_rows(path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["fyear"], "2019");
        assert_eq!(rows[1]["industry"], "");
    }

    #[test]
    fn test_extension_checks() {
        assert!(is_yaml("config.YML"));
        assert!(!is_yaml("config.json"));
        assert!(!is_csv("data"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_csv_rows("/nonexistent/input.csv").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
