//! Company-year input records and the canonical ratio vector.
//!
//! A [`FinancialRecord`] carries raw statement line items, the five ratios
//! directly, or both. Tabular rows (CSV cells keyed by column name) are
//! parsed with [`FinancialRecord::from_row`], which accepts the column
//! aliases used by upstream datasets (`tic`/`ticker`, `fyear`/`fiscal_year`,
//! `X1`/`x1`).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::types::{Money, Ratio};
use crate::{RiskError, RiskResult};

/// Display names of the five ratios, in X1..X5 order.
pub const RATIO_NAMES: [&str; 5] = [
    "X1: Working Capital / Total Assets",
    "X2: Retained Earnings / Total Assets",
    "X3: EBIT / Total Assets",
    "X4: Market Value of Equity / Liabilities",
    "X5: Sales / Total Assets",
];

// ---------------------------------------------------------------------------
// RatioVector
// ---------------------------------------------------------------------------

/// The five canonical solvency ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioVector {
    #[serde(rename = "X1", alias = "x1")]
    pub x1: Ratio,
    #[serde(rename = "X2", alias = "x2")]
    pub x2: Ratio,
    #[serde(rename = "X3", alias = "x3")]
    pub x3: Ratio,
    #[serde(rename = "X4", alias = "x4")]
    pub x4: Ratio,
    #[serde(rename = "X5", alias = "x5")]
    pub x5: Ratio,
}

impl RatioVector {
    pub fn new(x1: Ratio, x2: Ratio, x3: Ratio, x4: Ratio, x5: Ratio) -> Self {
        Self { x1, x2, x3, x4, x5 }
    }

    pub fn from_array(values: [Ratio; 5]) -> Self {
        let [x1, x2, x3, x4, x5] = values;
        Self { x1, x2, x3, x4, x5 }
    }

    pub fn as_array(&self) -> [Ratio; 5] {
        [self.x1, self.x2, self.x3, self.x4, self.x5]
    }
}

// ---------------------------------------------------------------------------
// FinancialRecord
// ---------------------------------------------------------------------------

/// Raw company-year input.
///
/// Every monetary field is optional: which ones are required depends on
/// whether the ratios are supplied directly and on the derivation config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRecord {
    #[serde(rename = "tic", alias = "ticker")]
    pub ticker: String,
    #[serde(rename = "fyear", alias = "fiscal_year")]
    pub fiscal_year: i32,
    #[serde(default)]
    pub industry: Option<String>,

    #[serde(default)]
    pub current_assets: Option<Money>,
    #[serde(default)]
    pub current_liabilities: Option<Money>,
    #[serde(default)]
    pub total_assets: Option<Money>,
    #[serde(default)]
    pub retained_earnings: Option<Money>,
    #[serde(default)]
    pub shareholders_equity: Option<Money>,
    #[serde(default)]
    pub ebit: Option<Money>,
    #[serde(default)]
    pub total_sales: Option<Money>,
    #[serde(default)]
    pub total_liabilities: Option<Money>,
    #[serde(default)]
    pub long_term_debt: Option<Money>,
    #[serde(default)]
    pub stock_price: Option<Money>,
    #[serde(default)]
    pub shares_outstanding: Option<Money>,

    // Pre-computed ratios. Not serialized: scored output carries the
    // effective ratios instead.
    #[serde(default, rename = "X1", alias = "x1", skip_serializing)]
    pub x1: Option<Ratio>,
    #[serde(default, rename = "X2", alias = "x2", skip_serializing)]
    pub x2: Option<Ratio>,
    #[serde(default, rename = "X3", alias = "x3", skip_serializing)]
    pub x3: Option<Ratio>,
    #[serde(default, rename = "X4", alias = "x4", skip_serializing)]
    pub x4: Option<Ratio>,
    #[serde(default, rename = "X5", alias = "x5", skip_serializing)]
    pub x5: Option<Ratio>,
}

impl FinancialRecord {
    pub fn new(ticker: impl Into<String>, fiscal_year: i32) -> Self {
        Self {
            ticker: ticker.into(),
            fiscal_year,
            ..Self::default()
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            ticker: self.ticker.clone(),
            fiscal_year: Some(self.fiscal_year),
        }
    }

    /// The five ratios when all of them were supplied with the record.
    pub fn supplied_ratios(&self) -> Option<RatioVector> {
        Some(RatioVector {
            x1: self.x1?,
            x2: self.x2?,
            x3: self.x3?,
            x4: self.x4?,
            x5: self.x5?,
        })
    }

    pub fn with_ratios(mut self, ratios: RatioVector) -> Self {
        self.x1 = Some(ratios.x1);
        self.x2 = Some(ratios.x2);
        self.x3 = Some(ratios.x3);
        self.x4 = Some(ratios.x4);
        self.x5 = Some(ratios.x5);
        self
    }

    /// Parse a tabular row of text cells keyed by column name.
    ///
    /// Column names are matched case-insensitively. Empty cells are treated
    /// as absent; a non-empty cell that is not a number is rejected.
    pub fn from_row(row: &BTreeMap<String, String>) -> RiskResult<Self> {
        let cells = normalise_row(row);

        let ticker = cell(&cells, &["tic", "ticker"])
            .ok_or_else(|| RiskError::MissingField {
                field: "tic".into(),
            })?
            .to_string();
        let fiscal_year = match cell(&cells, &["fyear", "fiscal_year"]) {
            Some(raw) => parse_year(raw)?,
            None => {
                return Err(RiskError::MissingField {
                    field: "fyear".into(),
                })
            }
        };

        let money = |name: &str| -> RiskResult<Option<Money>> {
            cell(&cells, &[name])
                .map(|raw| parse_decimal(name, raw))
                .transpose()
        };

        Ok(FinancialRecord {
            ticker,
            fiscal_year,
            industry: cell(&cells, &["industry"]).map(str::to_string),
            current_assets: money("current_assets")?,
            current_liabilities: money("current_liabilities")?,
            total_assets: money("total_assets")?,
            retained_earnings: money("retained_earnings")?,
            shareholders_equity: money("shareholders_equity")?,
            ebit: money("ebit")?,
            total_sales: money("total_sales")?,
            total_liabilities: money("total_liabilities")?,
            long_term_debt: money("long_term_debt")?,
            stock_price: money("stock_price")?,
            shares_outstanding: money("shares_outstanding")?,
            x1: money("x1")?,
            x2: money("x2")?,
            x3: money("x3")?,
            x4: money("x4")?,
            x5: money("x5")?,
        })
    }

    /// Parse one record from JSON with the same rules as a tabular row, so
    /// `"fyear": 2019.0` and `"X1": ""` are read the way a one-row batch
    /// would read them.
    pub fn from_json(value: Value) -> RiskResult<Self> {
        match json_rows(value)?.as_slice() {
            [row] => Self::from_row(row),
            rows => Err(RiskError::InvalidInput {
                field: "record".into(),
                reason: format!("expected exactly one record, got {}", rows.len()),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordKey
// ---------------------------------------------------------------------------

/// Identifies a record in failure reports.
///
/// `fiscal_year` is `None` only when a raw row's year cell was absent or
/// unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    #[serde(rename = "tic")]
    pub ticker: String,
    #[serde(rename = "fyear")]
    pub fiscal_year: Option<i32>,
}

impl RecordKey {
    /// Best-effort key for a row that may not parse as a record.
    pub fn from_row(row: &BTreeMap<String, String>) -> Self {
        let cells = normalise_row(row);
        RecordKey {
            ticker: cell(&cells, &["tic", "ticker"])
                .unwrap_or_default()
                .to_string(),
            fiscal_year: cell(&cells, &["fyear", "fiscal_year"]).and_then(|y| parse_year(y).ok()),
        }
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.fiscal_year {
            Some(year) => write!(f, "{}/{}", self.ticker, year),
            None => write!(f, "{}/?", self.ticker),
        }
    }
}

// ---------------------------------------------------------------------------
// Row parsing helpers
// ---------------------------------------------------------------------------

/// Flatten JSON records into text rows keyed by column name, so JSON and
/// CSV input go through the same per-row parsing.
///
/// Accepts an array of objects, a `{"records": [...]}` envelope, or a
/// single object. Numbers keep their literal text; `null` becomes an empty
/// cell.
pub fn json_rows(value: Value) -> RiskResult<Vec<BTreeMap<String, String>>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                map.insert("records".into(), other);
                vec![Value::Object(map)]
            }
            None => vec![Value::Object(map)],
        },
        other => {
            return Err(RiskError::InvalidInput {
                field: "records".into(),
                reason: format!("expected an array of records, got {other}"),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, cell_text(v))).collect()),
            other => Err(RiskError::InvalidInput {
                field: format!("records[{i}]"),
                reason: format!("not an object: {other}"),
            }),
        })
        .collect()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn normalise_row(row: &BTreeMap<String, String>) -> BTreeMap<String, &str> {
    row.iter()
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
        .collect()
}

fn cell<'a>(cells: &BTreeMap<String, &'a str>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|n| cells.get(*n).copied())
        .find(|v| !v.is_empty())
}

fn parse_decimal(field: &str, raw: &str) -> RiskResult<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| RiskError::InvalidInput {
            field: field.to_string(),
            reason: format!("'{raw}' is not a number"),
        })
}

/// Years may arrive as `2019` or, from float-typed exports, `2019.0`.
fn parse_year(raw: &str) -> RiskResult<i32> {
    let invalid = || RiskError::InvalidInput {
        field: "fyear".into(),
        reason: format!("'{raw}' is not an integer year"),
    };
    if let Ok(year) = raw.parse::<i32>() {
        return Ok(year);
    }
    let value = Decimal::from_str(raw).map_err(|_| invalid())?;
    if !value.fract().is_zero() {
        return Err(invalid());
    }
    value.to_i32().ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_row_raw_fields() {
        let r = row(&[
            ("tic", "ACME"),
            ("fyear", "2019"),
            ("industry", "Tech"),
            ("current_assets", "500"),
            ("current_liabilities", "300"),
            ("total_assets", "1000"),
            ("ebit", ""),
        ]);
        let record = FinancialRecord::from_row(&r).unwrap();
        assert_eq!(record.ticker, "ACME");
        assert_eq!(record.fiscal_year, 2019);
        assert_eq!(record.industry.as_deref(), Some("Tech"));
        assert_eq!(record.current_assets, Some(dec!(500)));
        assert_eq!(record.ebit, None);
        assert!(record.supplied_ratios().is_none());
    }

    #[test]
    fn test_from_row_ratio_columns_and_aliases() {
        let r = row(&[
            ("Ticker", "ACME"),
            ("Fiscal_Year", "2020.0"),
            ("X1", "0.2"),
            ("X2", "0.1"),
            ("X3", "0.05"),
            ("X4", "0.3"),
            ("X5", "0.4"),
        ]);
        let record = FinancialRecord::from_row(&r).unwrap();
        assert_eq!(record.fiscal_year, 2020);
        let ratios = record.supplied_ratios().unwrap();
        assert_eq!(
            ratios.as_array(),
            [dec!(0.2), dec!(0.1), dec!(0.05), dec!(0.3), dec!(0.4)]
        );
    }

    #[test]
    fn test_from_row_non_numeric_field() {
        let r = row(&[("tic", "ACME"), ("fyear", "2019"), ("ebit", "n/a")]);
        match FinancialRecord::from_row(&r).unwrap_err() {
            RiskError::InvalidInput { field, .. } => assert_eq!(field, "ebit"),
            other => panic!("Expected InvalidInput for ebit, got {other:?}"),
        }
    }

    #[test]
    fn test_from_row_missing_ticker() {
        let r = row(&[("fyear", "2019")]);
        match FinancialRecord::from_row(&r).unwrap_err() {
            RiskError::MissingField { field } => assert_eq!(field, "tic"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_fractional_year_rejected() {
        assert!(parse_year("2019.5").is_err());
        assert_eq!(parse_year("2019.000").unwrap(), 2019);
    }

    #[test]
    fn test_record_key_best_effort() {
        let key = RecordKey::from_row(&row(&[("tic", "ACME"), ("fyear", "soon")]));
        assert_eq!(key.ticker, "ACME");
        assert_eq!(key.fiscal_year, None);
        assert_eq!(key.to_string(), "ACME/?");
    }

    #[test]
    fn test_json_accepts_numbers_and_strings() {
        let json = r#"{"tic":"ACME","fyear":2021,"total_assets":"1000","ebit":120.5}"#;
        let record: FinancialRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_assets, Some(dec!(1000)));
        assert_eq!(record.ebit, Some(dec!(120.5)));
        assert_eq!(record.industry, None);
    }

    #[test]
    fn test_json_rows_from_array() {
        let rows = json_rows(serde_json::json!([
            {"tic": "AAA", "fyear": 2020, "X1": 0.2, "industry": null},
            {"tic": "BBB", "fyear": "2021"}
        ]))
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["fyear"], "2020");
        assert_eq!(rows[0]["X1"], "0.2");
        assert_eq!(rows[0]["industry"], "");
        assert_eq!(rows[1]["fyear"], "2021");
    }

    #[test]
    fn test_json_rows_from_records_envelope() {
        let rows =
            json_rows(serde_json::json!({"records": [{"tic": "AAA", "fyear": 2020}]})).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["tic"], "AAA");
    }

    #[test]
    fn test_json_rows_rejects_scalars() {
        assert!(json_rows(serde_json::json!(42)).is_err());
        match json_rows(serde_json::json!([{"tic": "AAA"}, 2])).unwrap_err() {
            RiskError::InvalidInput { field, .. } => assert_eq!(field, "records[1]"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_reads_like_a_row() {
        let record = FinancialRecord::from_json(serde_json::json!({
            "tic": "ACME",
            "fyear": 2019.0,
            "X1": "",
            "current_assets": 500,
            "total_assets": "1000"
        }))
        .unwrap();
        assert_eq!(record.fiscal_year, 2019);
        assert_eq!(record.x1, None);
        assert_eq!(record.current_assets, Some(dec!(500)));
        assert_eq!(record.total_assets, Some(dec!(1000)));
    }

    #[test]
    fn test_from_json_requires_one_record() {
        let err = FinancialRecord::from_json(serde_json::json!([
            {"tic": "AAA", "fyear": 2019},
            {"tic": "BBB", "fyear": 2019}
        ]))
        .unwrap_err();
        assert!(matches!(err, RiskError::InvalidInput { .. }));
    }
}
