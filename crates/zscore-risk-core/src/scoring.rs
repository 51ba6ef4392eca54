//! Weighted ratio score ("Z-Score").
//!
//! z = w1·X1 + w2·X2 + w3·X3 + w4·X4 + w5·X5, with the weight vector picked
//! per industry from a [`WeightTable`]. The score is explanatory only; risk
//! zones come from the model probability.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ratios::overflow;
use crate::record::{RatioVector, RATIO_NAMES};
use crate::types::Ratio;
use crate::{RiskError, RiskResult};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One weight per ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightVector {
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

impl WeightVector {
    pub fn new(x1: Ratio, x2: Ratio, x3: Ratio, x4: Ratio, x5: Ratio) -> Self {
        Self { x1, x2, x3, x4, x5 }
    }

    pub fn as_array(&self) -> [Ratio; 5] {
        [self.x1, self.x2, self.x3, self.x4, self.x5]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZScoreComponent {
    pub name: String,
    pub ratio: Decimal,
    pub weight: Decimal,
    pub weighted_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZScoreBreakdown {
    pub z_score: Decimal,
    pub components: Vec<ZScoreComponent>,
}

// ---------------------------------------------------------------------------
// Weight table
// ---------------------------------------------------------------------------

// Healthcare: original public-company Altman coefficients.
const HEALTHCARE_WEIGHTS: [Decimal; 5] = [dec!(1.2), dec!(1.4), dec!(3.3), dec!(0.6), dec!(1.0)];

// Tech: non-manufacturing coefficients; asset turnover carries no weight.
const TECH_WEIGHTS: [Decimal; 5] = [dec!(6.56), dec!(3.26), dec!(6.72), dec!(1.05), dec!(0)];

/// Industry name → weight vector.
///
/// Names are matched case-insensitively with surrounding whitespace ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    industries: BTreeMap<String, WeightVector>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WeightTable {
    pub fn empty() -> Self {
        Self {
            industries: BTreeMap::new(),
        }
    }

    /// Healthcare and Tech.
    pub fn builtin() -> Self {
        let [h1, h2, h3, h4, h5] = HEALTHCARE_WEIGHTS;
        let [t1, t2, t3, t4, t5] = TECH_WEIGHTS;
        Self::empty()
            .with_industry("Healthcare", WeightVector::new(h1, h2, h3, h4, h5))
            .with_industry("Tech", WeightVector::new(t1, t2, t3, t4, t5))
    }

    pub fn with_industry(mut self, industry: &str, weights: WeightVector) -> Self {
        self.insert(industry, weights);
        self
    }

    /// Insert or replace an industry, replacing any entry that differs only
    /// in case.
    pub fn insert(&mut self, industry: &str, weights: WeightVector) {
        let name = industry.trim();
        self.industries.retain(|k, _| !k.eq_ignore_ascii_case(name));
        self.industries.insert(name.to_string(), weights);
    }

    /// Entries of `other` override entries of `self`.
    pub fn merge(&mut self, other: &WeightTable) {
        for (name, weights) in &other.industries {
            self.insert(name, *weights);
        }
    }

    pub fn lookup(&self, industry: &str) -> RiskResult<&WeightVector> {
        let name = industry.trim();
        self.industries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, w)| w)
            .ok_or_else(|| RiskError::UnknownIndustry {
                industry: industry.to_string(),
            })
    }

    pub fn industries(&self) -> impl Iterator<Item = (&str, &WeightVector)> {
        self.industries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.industries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.industries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Linear combination of ratios and weights with a per-component breakdown.
///
/// A product or running sum outside the decimal range is an input error for
/// this record only.
pub fn weighted_score(
    ratios: &RatioVector,
    weights: &WeightVector,
) -> RiskResult<ZScoreBreakdown> {
    let components = RATIO_NAMES
        .iter()
        .zip(ratios.as_array())
        .zip(weights.as_array())
        .map(|((name, ratio), weight)| {
            let weighted_value = weight
                .checked_mul(ratio)
                .ok_or_else(|| overflow(&format!("{name} weighted value")))?;
            Ok(ZScoreComponent {
                name: name.to_string(),
                ratio,
                weight,
                weighted_value,
            })
        })
        .collect::<RiskResult<Vec<ZScoreComponent>>>()?;

    let z_score = components
        .iter()
        .try_fold(Decimal::ZERO, |acc, c| acc.checked_add(c.weighted_value))
        .ok_or_else(|| overflow("z_score"))?;

    Ok(ZScoreBreakdown {
        z_score,
        components,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
