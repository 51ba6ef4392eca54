use std::path::PathBuf;

use tracing::debug;
use zscore_risk_core::ratios::DEFAULT_DENOMINATOR_PLACEHOLDER;
use zscore_risk_core::{EngineConfig, FittedModel, RiskEngine, RiskError};

use crate::input;
use crate::GlobalArgs;

/// Load the engine configuration from `--config`, or defaults.
pub fn load_config(global: &GlobalArgs) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config = match global.config.as_deref() {
        None => EngineConfig::default(),
        Some(path) if input::file::is_yaml(path) => input::file::read_yaml(path)?,
        Some(path) => input::file::read_json(path)?,
    };
    debug!(config = ?config, "engine configuration loaded");
    Ok(config)
}

/// Load both model artifacts. Paths on the command line win over the
/// `artifacts` section of the config file.
pub fn load_model(
    global: &GlobalArgs,
    config: &EngineConfig,
) -> Result<FittedModel, Box<dyn std::error::Error>> {
    let from_config = config.artifacts.as_ref();
    let scaler = global
        .scaler
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| from_config.map(|a| a.scaler.clone()));
    let model = global
        .model
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| from_config.map(|a| a.model.clone()));

    match (scaler, model) {
        (Some(scaler), Some(model)) => Ok(FittedModel::load(&scaler, &model)?),
        _ => Err(RiskError::Configuration(
            "model artifacts not configured: pass --scaler and --model, \
             or set artifacts.scaler and artifacts.model in --config"
                .to_string(),
        )
        .into()),
    }
}

/// Build the engine. Interactive entry fills absent total assets and the
/// X4 denominator with the placeholder unless the config already sets one.
pub fn load_engine(
    global: &GlobalArgs,
    interactive: bool,
) -> Result<RiskEngine<FittedModel>, Box<dyn std::error::Error>> {
    let mut config = load_config(global)?;
    if interactive {
        config
            .derivation
            .total_assets_default
            .get_or_insert(DEFAULT_DENOMINATOR_PLACEHOLDER);
        config
            .derivation
            .leverage_default
            .get_or_insert(DEFAULT_DENOMINATOR_PLACEHOLDER);
    }
    let model = load_model(global, &config)?;
    Ok(RiskEngine::from_config(model, &config)?)
}
