//! Pre-trained classifier boundary.
//!
//! The core only needs two capabilities from a fitted model: `scale` (the
//! normalisation fitted offline) and `predict_probability`. [`RiskModel`]
//! captures exactly that, so tests can swap in deterministic stubs.
//!
//! [`FittedModel`] is the shipped implementation. It is built from two
//! named, versioned JSON artifacts:
//!
//! ```json
//! { "name": "altman-scaler", "version": "2024.1", "kind": "standard",
//!   "mean": [0.1, 0.2, 0.05, 1.1, 0.9], "scale": [0.2, 0.3, 0.1, 2.0, 0.6] }
//!
//! { "name": "altman-lda", "version": "2024.1", "kind": "lda",
//!   "coefficients": [1.1, 0.8, 2.4, 0.3, 0.5], "intercept": -0.2 }
//! ```
//!
//! Probabilities follow the binary LDA / logistic link: p = σ(w·z + b).

use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::record::RatioVector;
use crate::types::Rate;
use crate::{RiskError, RiskResult};

// ---------------------------------------------------------------------------
// Capability interface
// ---------------------------------------------------------------------------

/// Ratios after the fitted normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledFeatures(pub [Decimal; 5]);

/// Artifact identity reported alongside every evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub scaler_name: String,
    pub scaler_version: String,
    pub model_name: String,
    pub model_version: String,
    pub model_kind: String,
}

pub trait RiskModel {
    fn scale(&self, ratios: &RatioVector) -> RiskResult<ScaledFeatures>;

    fn predict_probability(&self, features: &ScaledFeatures) -> RiskResult<Rate>;

    fn info(&self) -> ModelInfo;
}

impl<M: RiskModel + ?Sized> RiskModel for Box<M> {
    fn scale(&self, ratios: &RatioVector) -> RiskResult<ScaledFeatures> {
        (**self).scale(ratios)
    }

    fn predict_probability(&self, features: &ScaledFeatures) -> RiskResult<Rate> {
        (**self).predict_probability(features)
    }

    fn info(&self) -> ModelInfo {
        (**self).info()
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerTransform {
    /// z = (x - mean) / scale
    Standard {
        mean: [Decimal; 5],
        scale: [Decimal; 5],
    },
    Identity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub name: String,
    pub version: String,
    #[serde(flatten)]
    pub transform: ScalerTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Lda,
    Logistic,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lda => write!(f, "Linear Discriminant Analysis"),
            Self::Logistic => write!(f, "Logistic Regression"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub name: String,
    pub version: String,
    pub kind: ClassifierKind,
    pub coefficients: [Decimal; 5],
    pub intercept: Decimal,
}

// ---------------------------------------------------------------------------
// FittedModel
// ---------------------------------------------------------------------------

/// Immutable scaler + classifier pair loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FittedModel {
    scaler: ScalerArtifact,
    classifier: ClassifierArtifact,
}

impl FittedModel {
    pub fn new(scaler: ScalerArtifact, classifier: ClassifierArtifact) -> RiskResult<Self> {
        validate_scaler(&scaler)?;
        validate_classifier(&classifier)?;
        Ok(Self { scaler, classifier })
    }

    pub fn from_json(scaler_json: &str, classifier_json: &str) -> RiskResult<Self> {
        let scaler: ScalerArtifact = serde_json::from_str(scaler_json)
            .map_err(|e| RiskError::Configuration(format!("scaler artifact is corrupt: {e}")))?;
        let classifier: ClassifierArtifact = serde_json::from_str(classifier_json)
            .map_err(|e| RiskError::Configuration(format!("model artifact is corrupt: {e}")))?;
        Self::new(scaler, classifier)
    }

    /// Read both artifacts from disk. Any failure is a configuration error.
    pub fn load(scaler_path: &Path, classifier_path: &Path) -> RiskResult<Self> {
        let scaler_json = read_artifact(scaler_path)?;
        let classifier_json = read_artifact(classifier_path)?;
        let model = Self::from_json(&scaler_json, &classifier_json)?;
        info!(
            scaler = %model.scaler.name,
            scaler_version = %model.scaler.version,
            model = %model.classifier.name,
            model_version = %model.classifier.version,
            "model artifacts loaded"
        );
        Ok(model)
    }

    pub fn scaler(&self) -> &ScalerArtifact {
        &self.scaler
    }

    pub fn classifier(&self) -> &ClassifierArtifact {
        &self.classifier
    }
}

impl RiskModel for FittedModel {
    fn scale(&self, ratios: &RatioVector) -> RiskResult<ScaledFeatures> {
        let x = ratios.as_array();
        match &self.scaler.transform {
            ScalerTransform::Identity => Ok(ScaledFeatures(x)),
            ScalerTransform::Standard { mean, scale } => {
                let mut z = [Decimal::ZERO; 5];
                for i in 0..5 {
                    z[i] = x[i]
                        .checked_sub(mean[i])
                        .and_then(|d| d.checked_div(scale[i]))
                        .ok_or_else(|| overflow(&format!("X{} scaling", i + 1)))?;
                }
                Ok(ScaledFeatures(z))
            }
        }
    }

    fn predict_probability(&self, features: &ScaledFeatures) -> RiskResult<Rate> {
        let mut decision = self.classifier.intercept;
        for (w, z) in self.classifier.coefficients.iter().zip(features.0.iter()) {
            decision = w
                .checked_mul(*z)
                .and_then(|t| decision.checked_add(t))
                .ok_or_else(|| overflow("decision function"))?;
        }
        Ok(logistic(decision))
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            scaler_name: self.scaler.name.clone(),
            scaler_version: self.scaler.version.clone(),
            model_name: self.classifier.name.clone(),
            model_version: self.classifier.version.clone(),
            model_kind: self.classifier.kind.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// σ(x) = 1 / (1 + e^-x), evaluated via e^-|x| so the exponent never
/// overflows. Saturates to exactly 0 or 1 far in the tails.
pub(crate) fn logistic(x: Decimal) -> Decimal {
    let e = (-x.abs()).checked_exp().unwrap_or(Decimal::ZERO);
    let denom = Decimal::ONE + e;
    if x.is_sign_negative() {
        e / denom
    } else {
        Decimal::ONE / denom
    }
}

fn overflow(context: &str) -> RiskError {
    RiskError::InvalidInput {
        field: context.to_string(),
        reason: "value overflows decimal range".into(),
    }
}

fn read_artifact(path: &Path) -> RiskResult<String> {
    fs::read_to_string(path).map_err(|e| {
        RiskError::Configuration(format!(
            "cannot load model artifact '{}': {}",
            path.display(),
            e
        ))
    })
}

fn validate_identity(kind: &str, name: &str, version: &str) -> RiskResult<()> {
    if name.trim().is_empty() {
        return Err(RiskError::Configuration(format!("{kind} artifact has no name")));
    }
    if version.trim().is_empty() {
        return Err(RiskError::Configuration(format!(
            "{kind} artifact '{name}' has no version"
        )));
    }
    Ok(())
}

fn validate_scaler(scaler: &ScalerArtifact) -> RiskResult<()> {
    validate_identity("scaler", &scaler.name, &scaler.version)?;
    if let ScalerTransform::Standard { scale, .. } = &scaler.transform {
        if let Some(i) = scale.iter().position(|s| *s <= Decimal::ZERO) {
            return Err(RiskError::Configuration(format!(
                "scaler artifact '{}': scale for X{} must be positive, got {}",
                scaler.name,
                i + 1,
                scale[i]
            )));
        }
    }
    Ok(())
}

fn validate_classifier(classifier: &ClassifierArtifact) -> RiskResult<()> {
    validate_identity("model", &classifier.name, &classifier.version)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
