use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ratios::DerivationConfig;
use crate::scoring::WeightTable;
use crate::zones::{ZoneTable, ZoneThresholds};
use crate::RiskResult;

/// Locations of the two fitted artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub scaler: PathBuf,
    pub model: PathBuf,
}

/// Engine configuration. Every section is optional in the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub derivation: DerivationConfig,
    pub zones: ZoneThresholds,
    /// Industry weights. Merged over the built-in table unless
    /// `extend_builtin_weights` is false, in which case they replace it.
    pub weights: Option<WeightTable>,
    pub extend_builtin_weights: bool,
    pub artifacts: Option<ArtifactPaths>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            derivation: DerivationConfig::strict(),
            zones: ZoneThresholds::default(),
            weights: None,
            extend_builtin_weights: true,
            artifacts: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> RiskResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn weight_table(&self) -> WeightTable {
        match (&self.weights, self.extend_builtin_weights) {
            (None, _) => WeightTable::builtin(),
            (Some(custom), true) => {
                let mut table = WeightTable::builtin();
                table.merge(custom);
                table
            }
            (Some(custom), false) => custom.clone(),
        }
    }

    pub fn zone_table(&self) -> RiskResult<ZoneTable> {
        ZoneTable::new(self.zones)
    }
}
