use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use zscore_risk_core::record::json_rows;
use zscore_risk_core::zones::classify_probability as classify;
use zscore_risk_core::{
    EngineConfig, EvaluationOptions, FinancialRecord, FittedModel, RiskEngine, RiskError,
};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Build an engine from an `EngineConfig` JSON document. The config must
/// carry `artifacts.scaler` and `artifacts.model` paths.
fn engine_from_config(config_json: &str) -> NapiResult<RiskEngine<FittedModel>> {
    let config = EngineConfig::from_json_str(config_json).map_err(to_napi_error)?;
    let artifacts = config.artifacts.as_ref().ok_or_else(|| {
        to_napi_error(RiskError::Configuration(
            "artifacts.scaler and artifacts.model are required".into(),
        ))
    })?;
    let model = FittedModel::load(&artifacts.scaler, &artifacts.model).map_err(to_napi_error)?;
    RiskEngine::from_config(model, &config).map_err(to_napi_error)
}

fn parse_json(json: &str) -> NapiResult<serde_json::Value> {
    serde_json::from_str(json).map_err(to_napi_error)
}

fn options_from_json(options_json: Option<String>) -> NapiResult<EvaluationOptions> {
    match options_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(EvaluationOptions::default()),
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

#[napi]
pub fn evaluate_record(
    config_json: String,
    record_json: String,
    options_json: Option<String>,
) -> NapiResult<String> {
    let engine = engine_from_config(&config_json)?;
    let record = FinancialRecord::from_json(parse_json(&record_json)?).map_err(to_napi_error)?;
    let options = options_from_json(options_json)?;
    let output = engine.evaluate(&record, &options).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Score an array of records. Values may be numbers or cell text as read
/// from a spreadsheet.
#[napi]
pub fn evaluate_batch(
    config_json: String,
    records_json: String,
    options_json: Option<String>,
) -> NapiResult<String> {
    let engine = engine_from_config(&config_json)?;
    let rows = json_rows(parse_json(&records_json)?).map_err(to_napi_error)?;
    let options = options_from_json(options_json)?;
    let output = engine.evaluate_rows(&rows, &options).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// Risk-zone label for a probability given as a decimal string.
#[napi]
pub fn classify_probability(probability: String) -> NapiResult<String> {
    let p: Decimal = probability.trim().parse().map_err(to_napi_error)?;
    let zone = classify(p).map_err(to_napi_error)?;
    Ok(zone.label().to_string())
}
