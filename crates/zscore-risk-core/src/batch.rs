//! Portfolio batch scoring with per-record failure isolation.
//!
//! Successful records keep their input order. A record that cannot be
//! scored is reported in `failures` with its key and reason and never
//! affects its siblings. The batch as a whole only fails when it is empty
//! or when every record failed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{info, warn};

use crate::error::ErrorCategory;
use crate::evaluate::{EvaluationOptions, RiskEngine, ScoredRecord};
use crate::model::RiskModel;
use crate::record::{FinancialRecord, RecordKey};
use crate::types::*;
use crate::zones::RiskZone;
use crate::{RiskError, RiskResult};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    /// Zero-based position in the input.
    pub row: usize,
    pub key: RecordKey,
    pub category: ErrorCategory,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub zone_counts: BTreeMap<RiskZone, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutput {
    pub scored: Vec<ScoredRecord>,
    pub failures: Vec<RecordFailure>,
    pub summary: BatchSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl<M: RiskModel> RiskEngine<M> {
    /// Score typed records.
    pub fn evaluate_batch(
        &self,
        records: &[FinancialRecord],
        options: &EvaluationOptions,
    ) -> RiskResult<ComputationOutput<BatchOutput>> {
        let start = Instant::now();
        let outcomes = records
            .iter()
            .map(|r| (r.key(), self.score_record(r, options)));
        self.collect(outcomes, records.len(), start)
    }

    /// Score untyped tabular rows (column name → cell text). Rows that do
    /// not parse are reported as failures like any other bad record.
    pub fn evaluate_rows(
        &self,
        rows: &[BTreeMap<String, String>],
        options: &EvaluationOptions,
    ) -> RiskResult<ComputationOutput<BatchOutput>> {
        let start = Instant::now();
        let outcomes = rows.iter().map(|row| match FinancialRecord::from_row(row) {
            Ok(record) => (record.key(), self.score_record(&record, options)),
            Err(e) => (RecordKey::from_row(row), Err(e)),
        });
        self.collect(outcomes, rows.len(), start)
    }

    fn collect(
        &self,
        outcomes: impl Iterator<Item = (RecordKey, RiskResult<ScoredRecord>)>,
        total: usize,
        start: Instant,
    ) -> RiskResult<ComputationOutput<BatchOutput>> {
        if total == 0 {
            return Err(RiskError::InsufficientData(
                "batch contains no records".into(),
            ));
        }

        let mut scored = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut warnings = Vec::new();

        for (row, (key, outcome)) in outcomes.enumerate() {
            match outcome {
                Ok(record) => {
                    for sub in &record.substitutions {
                        warnings.push(format!("{key}: {sub}"));
                    }
                    scored.push(record);
                }
                Err(e) => {
                    warn!(row, key = %key, error = %e, "record excluded from batch");
                    failures.push(RecordFailure {
                        row,
                        key,
                        category: e.category(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if scored.is_empty() {
            return Err(RiskError::InsufficientData(format!(
                "all {} records failed; first failure: {}",
                total,
                failures
                    .first()
                    .map(|f| format!("{} ({})", f.reason, f.key))
                    .unwrap_or_default()
            )));
        }

        let summary = summarise(&scored, failures.len());
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch scored"
        );

        let output = BatchOutput {
            scored,
            failures,
            summary,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Bankruptcy risk batch: per-record discriminant probability and risk zone",
            &self.assumptions(),
            warnings,
            elapsed,
            output,
        ))
    }
}

fn summarise(scored: &[ScoredRecord], failed: usize) -> BatchSummary {
    let mut zone_counts: BTreeMap<RiskZone, usize> =
        RiskZone::ALL.iter().map(|z| (*z, 0)).collect();
    for record in scored {
        *zone_counts.entry(record.risk_zone).or_insert(0) += 1;
    }
    BatchSummary {
        total: scored.len() + failed,
        succeeded: scored.len(),
        failed,
        zone_counts,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelInfo, ScaledFeatures};
    use crate::record::RatioVector;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    /// Probability is always the configured constant.
    struct ConstantModel(Decimal);

    impl RiskModel for ConstantModel {
        fn scale(&self, ratios: &RatioVector) -> RiskResult<ScaledFeatures> {
            Ok(ScaledFeatures(ratios.as_array()))
        }

        fn predict_probability(&self, _features: &ScaledFeatures) -> RiskResult<Rate> {
            Ok(self.0)
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                scaler_name: "identity".into(),
                scaler_version: "0".into(),
                model_name: "constant".into(),
                model_version: "0".into(),
                model_kind: "stub".into(),
            }
        }
    }

    fn record(ticker: &str, year: i32, total_assets: Decimal) -> FinancialRecord {
        FinancialRecord {
            current_assets: Some(dec!(500)),
            current_liabilities: Some(dec!(300)),
            total_assets: Some(total_assets),
            retained_earnings: Some(dec!(100)),
            ebit: Some(dec!(50)),
            total_sales: Some(dec!(400)),
            total_liabilities: Some(dec!(500)),
            stock_price: Some(dec!(15)),
            shares_outstanding: Some(dec!(10)),
            ..FinancialRecord::new(ticker, year)
        }
    }

    #[test]
    fn test_failure_isolated_and_order_preserved() {
        let engine = RiskEngine::new(ConstantModel(dec!(0.7)));
        let records = vec![
            record("AAA", 2018, dec!(1000)),
            record("BBB", 2018, Decimal::ZERO),
            record("CCC", 2018, dec!(2000)),
        ];
        let out = engine
            .evaluate_batch(&records, &EvaluationOptions::default())
            .unwrap()
            .result;

        let tickers: Vec<&str> = out.scored.iter().map(|s| s.record.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "CCC"]);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].row, 1);
        assert_eq!(out.failures[0].key.ticker, "BBB");
        assert_eq!(out.failures[0].key.fiscal_year, Some(2018));
        assert_eq!(out.failures[0].category, ErrorCategory::DivisionByZero);
        assert_eq!(out.summary.total, 3);
        assert_eq!(out.summary.zone_counts[&RiskZone::VeryLowRisk], 2);
        assert_eq!(out.summary.zone_counts[&RiskZone::HighRisk], 0);
    }

    #[test]
    fn test_all_failed_is_error() {
        let engine = RiskEngine::new(ConstantModel(dec!(0.7)));
        let records = vec![record("AAA", 2018, Decimal::ZERO)];
        let err = engine
            .evaluate_batch(&records, &EvaluationOptions::default())
            .unwrap_err();
        match err {
            RiskError::InsufficientData(msg) => assert!(msg.contains("AAA/2018"), "{msg}"),
            other => panic!("Expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_batch_is_error() {
        let engine = RiskEngine::new(ConstantModel(dec!(0.7)));
        let err = engine
            .evaluate_batch(&[], &EvaluationOptions::default())
            .unwrap_err();
        assert!(matches!(err, RiskError::InsufficientData(_)));
    }

    #[test]
    fn test_rows_with_parse_failure() {
        let engine = RiskEngine::new(ConstantModel(dec!(0.45)));
        let row = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        let rows = vec![
            row(&[
                ("tic", "AAA"),
                ("fyear", "2020"),
                ("X1", "0.2"),
                ("X2", "0.1"),
                ("X3", "0.05"),
                ("X4", "0.3"),
                ("X5", "0.4"),
            ]),
            row(&[("tic", "BBB"), ("fyear", "2020"), ("X1", "abc")]),
        ];
        let out = engine
            .evaluate_rows(&rows, &EvaluationOptions::default())
            .unwrap()
            .result;
        assert_eq!(out.scored.len(), 1);
        assert_eq!(out.scored[0].risk_zone, RiskZone::VeryHighRisk);
        assert_eq!(out.failures[0].key.ticker, "BBB");
        assert_eq!(out.failures[0].category, ErrorCategory::Validation);
    }

    #[test]
    fn test_unknown_industry_is_per_record_failure() {
        let engine = RiskEngine::new(ConstantModel(dec!(0.7)));
        let mut good = record("AAA", 2019, dec!(1000));
        good.industry = Some("Tech".into());
        let mut bad = record("BBB", 2019, dec!(1000));
        bad.industry = Some("Mining".into());

        let out = engine
            .evaluate_batch(&[good, bad], &EvaluationOptions::default().with_z_score())
            .unwrap()
            .result;
        assert_eq!(out.scored.len(), 1);
        assert!(out.scored[0].z_score.is_some());
        assert!(out.failures[0].reason.contains("Mining"));
    }

    #[test]
    fn test_z_score_overflow_is_isolated() {
        let engine = RiskEngine::new(ConstantModel(dec!(0.7)));
        let huge = record("BBB", 2019, dec!(1000)).with_ratios(RatioVector::new(
            Decimal::MAX / dec!(2),
            dec!(0.1),
            dec!(0.05),
            dec!(0.3),
            dec!(0.4),
        ));
        let records = vec![record("AAA", 2019, dec!(1000)), huge, record("CCC", 2019, dec!(1000))];

        let options = EvaluationOptions::default().with_z_score().for_industry("Tech");
        let out = engine.evaluate_batch(&records, &options).unwrap().result;

        let tickers: Vec<&str> = out.scored.iter().map(|s| s.record.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAA", "CCC"]);
        assert!(out.scored.iter().all(|s| s.z_score.is_some()));
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].row, 1);
        assert_eq!(out.failures[0].category, ErrorCategory::Validation);
        assert!(out.failures[0].reason.contains("overflows"), "{}", out.failures[0].reason);
    }
}
