//! Single-record pipeline.
//!
//! record → ratios → scale → probability → zone, with the weighted Z-Score
//! computed alongside from the same ratios when requested.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::config::EngineConfig;
use crate::model::RiskModel;
use crate::ratios::{derive_ratios, DerivationConfig, RatioSource, Substitution};
use crate::record::{FinancialRecord, RatioVector};
use crate::scoring::{weighted_score, WeightTable, ZScoreBreakdown};
use crate::types::*;
use crate::zones::{RiskZone, ZoneTable};
use crate::{RiskError, RiskResult};

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Compute the weighted Z-Score. Requires an industry with weights.
    pub with_z_score: bool,
    /// Industry applied to every record, taking precedence over the
    /// record's own `industry`.
    pub industry_override: Option<String>,
}

impl EvaluationOptions {
    pub fn with_z_score(mut self) -> Self {
        self.with_z_score = true;
        self
    }

    pub fn for_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry_override = Some(industry.into());
        self
    }
}

/// A record annotated with both scores and its risk zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: FinancialRecord,
    #[serde(flatten)]
    pub ratios: RatioVector,
    pub ratio_source: RatioSource,
    pub z_score: Option<Decimal>,
    pub lda_probability: Rate,
    pub risk_zone: RiskZone,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub substitutions: Vec<Substitution>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Scoring engine over an immutable fitted model.
#[derive(Debug, Clone)]
pub struct RiskEngine<M: RiskModel> {
    model: M,
    derivation: DerivationConfig,
    zones: ZoneTable,
    weights: WeightTable,
}

impl<M: RiskModel> RiskEngine<M> {
    /// Strict derivation, default zone thresholds, built-in weights.
    pub fn new(model: M) -> Self {
        Self {
            model,
            derivation: DerivationConfig::strict(),
            zones: ZoneTable::default(),
            weights: WeightTable::builtin(),
        }
    }

    pub fn from_config(model: M, config: &EngineConfig) -> RiskResult<Self> {
        Ok(Self {
            model,
            derivation: config.derivation.clone(),
            zones: config.zone_table()?,
            weights: config.weight_table(),
        })
    }

    pub fn with_derivation(mut self, derivation: DerivationConfig) -> Self {
        self.derivation = derivation;
        self
    }

    pub fn with_zones(mut self, zones: ZoneTable) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_weights(mut self, weights: WeightTable) -> Self {
        self.weights = weights;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn derivation(&self) -> &DerivationConfig {
        &self.derivation
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Score one record without the output envelope. Errors are returned
    /// as-is; batch evaluation builds on this.
    pub fn score_record(
        &self,
        record: &FinancialRecord,
        options: &EvaluationOptions,
    ) -> RiskResult<ScoredRecord> {
        let industry = options
            .industry_override
            .clone()
            .or_else(|| record.industry.clone());

        let derivation = derive_ratios(record, &self.derivation)?;

        let scaled = self.model.scale(&derivation.ratios)?;
        let probability = self.model.predict_probability(&scaled)?;
        let risk_zone = self.zones.classify(probability)?;

        let z_score = if options.with_z_score {
            Some(self.z_score_breakdown(&derivation.ratios, industry.as_deref())?.z_score)
        } else {
            None
        };

        debug!(
            ticker = %record.ticker,
            fiscal_year = record.fiscal_year,
            probability = %probability,
            zone = %risk_zone,
            "record scored"
        );

        Ok(ScoredRecord {
            record: FinancialRecord {
                industry,
                ..record.clone()
            },
            ratios: derivation.ratios,
            ratio_source: derivation.source,
            z_score,
            lda_probability: probability,
            risk_zone,
            substitutions: derivation.substitutions,
        })
    }

    /// Score one record and wrap it with methodology and warnings.
    pub fn evaluate(
        &self,
        record: &FinancialRecord,
        options: &EvaluationOptions,
    ) -> RiskResult<ComputationOutput<ScoredRecord>> {
        let start = Instant::now();
        let scored = self.score_record(record, options)?;
        let warnings = scored.substitutions.iter().map(|s| s.to_string()).collect();

        let elapsed = start.elapsed().as_micros() as u64;
        Ok(with_metadata(
            "Bankruptcy risk: fitted discriminant probability with weighted ratio Z-Score",
            &self.assumptions(),
            warnings,
            elapsed,
            scored,
        ))
    }

    /// Per-component Z-Score breakdown for one record.
    pub fn explain(
        &self,
        record: &FinancialRecord,
        industry: Option<&str>,
    ) -> RiskResult<ZScoreBreakdown> {
        let derivation = derive_ratios(record, &self.derivation)?;
        let industry = industry.or(record.industry.as_deref());
        self.z_score_breakdown(&derivation.ratios, industry)
    }

    fn z_score_breakdown(
        &self,
        ratios: &RatioVector,
        industry: Option<&str>,
    ) -> RiskResult<ZScoreBreakdown> {
        let industry = industry.ok_or_else(|| RiskError::MissingField {
            field: "industry".into(),
        })?;
        let weights = self.weights.lookup(industry)?;
        weighted_score(ratios, weights)
    }

    pub(crate) fn assumptions(&self) -> serde_json::Value {
        serde_json::json!({
            "model": self.model.info(),
            "ratios": {
                "X1": "(current_assets - current_liabilities) / total_assets",
                "X2": format!("{} / total_assets", self.derivation.earnings_measure.field_name()),
                "X3": "ebit / total_assets",
                "X4": format!(
                    "(stock_price * shares_outstanding) / {}",
                    self.derivation.leverage_denominator.field_name()
                ),
                "X5": "total_sales / total_assets",
            },
            "zone_bands": self
                .zones
                .bands()
                .iter()
                .map(|b| format!("{} {}", b.describe(), b.zone))
                .collect::<Vec<_>>(),
            "z_score": "sum of industry weight * ratio; informational, not used for zones",
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelInfo, ScaledFeatures};
    use rust_decimal_macros::dec;

    /// Identity scaling; probability is X1 shifted into [0, 1].
    struct ShiftModel;

    impl RiskModel for ShiftModel {
        fn scale(&self, ratios: &RatioVector) -> RiskResult<ScaledFeatures> {
            Ok(ScaledFeatures(ratios.as_array()))
        }

        fn predict_probability(&self, features: &ScaledFeatures) -> RiskResult<Rate> {
            Ok(features.0[0] + dec!(0.3))
        }

        fn info(&self) -> ModelInfo {
            ModelInfo {
                scaler_name: "identity".into(),
                scaler_version: "0".into(),
                model_name: "shift".into(),
                model_version: "0".into(),
                model_kind: "stub".into(),
            }
        }
    }

    fn record() -> FinancialRecord {
        FinancialRecord {
            industry: Some("Healthcare".into()),
            current_assets: Some(dec!(500)),
            current_liabilities: Some(dec!(300)),
            total_assets: Some(dec!(1000)),
            retained_earnings: Some(dec!(100)),
            ebit: Some(dec!(50)),
            total_sales: Some(dec!(400)),
            total_liabilities: Some(dec!(500)),
            stock_price: Some(dec!(15)),
            shares_outstanding: Some(dec!(10)),
            ..FinancialRecord::new("ACME", 2019)
        }
    }

    #[test]
    fn test_score_record() {
        let engine = RiskEngine::new(ShiftModel);
        let scored = engine
            .score_record(&record(), &EvaluationOptions::default())
            .unwrap();
        // X1 = 0.2 → p = 0.5
        assert_eq!(scored.lda_probability, dec!(0.5));
        assert_eq!(scored.risk_zone, RiskZone::MediumRisk);
        assert_eq!(scored.z_score, None);
        assert_eq!(scored.ratio_source, RatioSource::Derived);
    }

    #[test]
    fn test_z_score_requested() {
        let engine = RiskEngine::new(ShiftModel);
        let scored = engine
            .score_record(&record(), &EvaluationOptions::default().with_z_score())
            .unwrap();
        // Healthcare weights: 1.2*0.2 + 1.4*0.1 + 3.3*0.05 + 0.6*0.3 + 1.0*0.4
        assert_eq!(scored.z_score, Some(dec!(1.125)));
    }

    #[test]
    fn test_industry_override() {
        let engine = RiskEngine::new(ShiftModel);
        let options = EvaluationOptions::default().with_z_score().for_industry("Tech");
        let scored = engine.score_record(&record(), &options).unwrap();
        assert_eq!(scored.record.industry.as_deref(), Some("Tech"));
        // 6.56*0.2 + 3.26*0.1 + 6.72*0.05 + 1.05*0.3 + 0
        assert_eq!(scored.z_score, Some(dec!(2.289)));
    }

    #[test]
    fn test_z_score_without_industry() {
        let engine = RiskEngine::new(ShiftModel);
        let mut r = record();
        r.industry = None;
        let err = engine
            .score_record(&r, &EvaluationOptions::default().with_z_score())
            .unwrap_err();
        match err {
            RiskError::MissingField { field } => assert_eq!(field, "industry"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_probability_surfaced() {
        let engine = RiskEngine::new(ShiftModel);
        let mut r = record();
        // X1 = 0.9 → p = 1.2
        r.current_assets = Some(dec!(1200));
        let err = engine
            .score_record(&r, &EvaluationOptions::default())
            .unwrap_err();
        assert!(matches!(err, RiskError::ProbabilityOutOfRange { .. }));
    }

    #[test]
    fn test_evaluate_surfaces_substitutions() {
        let engine = RiskEngine::new(ShiftModel).with_derivation(DerivationConfig::interactive());
        let mut r = record();
        r.total_liabilities = None;
        let out = engine.evaluate(&r, &EvaluationOptions::default()).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("total_liabilities"));
        assert_eq!(out.result.substitutions.len(), 1);
        // 150 / 1.0
        assert_eq!(out.result.ratios.x4, dec!(150));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_explain() {
        let engine = RiskEngine::new(ShiftModel);
        let breakdown = engine.explain(&record(), None).unwrap();
        assert_eq!(breakdown.components.len(), 5);
        assert_eq!(breakdown.z_score, dec!(1.125));
    }

    #[test]
    fn test_scored_record_serialises_flat() {
        let engine = RiskEngine::new(ShiftModel);
        let scored = engine
            .score_record(&record(), &EvaluationOptions::default())
            .unwrap();
        let value = serde_json::to_value(&scored).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj["tic"], "ACME");
        assert_eq!(obj["fyear"], 2019);
        assert_eq!(obj["risk_zone"], "Medium Risk");
        assert!(obj.contains_key("X1"));
        assert!(obj.contains_key("lda_probability"));
        assert!(!obj.contains_key("substitutions"));
    }
}
