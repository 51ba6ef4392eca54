//! Probability → risk zone.
//!
//! Reference policy over [0, 1]:
//!
//! | Band                | Zone           |
//! |---------------------|----------------|
//! | p < 0.49            | Very High Risk |
//! | 0.49 <= p < 0.50    | High Risk      |
//! | 0.50 <= p <= 0.51   | Medium Risk    |
//! | p > 0.51            | Very Low Risk  |
//!
//! The thresholds are configuration; the band layout (which side of each
//! boundary is inclusive) is fixed, so every p in [0, 1] hits exactly one
//! band.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Rate;
use crate::{RiskError, RiskResult};

pub const DEFAULT_VERY_HIGH_BELOW: Decimal = dec!(0.49);
pub const DEFAULT_HIGH_BELOW: Decimal = dec!(0.50);
pub const DEFAULT_MEDIUM_UP_TO: Decimal = dec!(0.51);

/// Ordered by increasing safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskZone {
    #[serde(rename = "Very High Risk")]
    VeryHighRisk,
    #[serde(rename = "High Risk")]
    HighRisk,
    #[serde(rename = "Medium Risk")]
    MediumRisk,
    #[serde(rename = "Very Low Risk")]
    VeryLowRisk,
}

impl RiskZone {
    pub const ALL: [RiskZone; 4] = [
        RiskZone::VeryHighRisk,
        RiskZone::HighRisk,
        RiskZone::MediumRisk,
        RiskZone::VeryLowRisk,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryHighRisk => "Very High Risk",
            Self::HighRisk => "High Risk",
            Self::MediumRisk => "Medium Risk",
            Self::VeryLowRisk => "Very Low Risk",
        }
    }
}

impl std::fmt::Display for RiskZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Boundary values for the four bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneThresholds {
    /// Upper bound (exclusive) of Very High Risk.
    pub very_high_below: Rate,
    /// Upper bound (exclusive) of High Risk.
    pub high_below: Rate,
    /// Upper bound (inclusive) of Medium Risk.
    pub medium_up_to: Rate,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            very_high_below: DEFAULT_VERY_HIGH_BELOW,
            high_below: DEFAULT_HIGH_BELOW,
            medium_up_to: DEFAULT_MEDIUM_UP_TO,
        }
    }
}

/// One row of the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneBand {
    pub lower: Rate,
    pub lower_inclusive: bool,
    pub upper: Rate,
    pub upper_inclusive: bool,
    pub zone: RiskZone,
}

impl ZoneBand {
    pub fn contains(&self, p: Rate) -> bool {
        let above = if self.lower_inclusive {
            p >= self.lower
        } else {
            p > self.lower
        };
        let below = if self.upper_inclusive {
            p <= self.upper
        } else {
            p < self.upper
        };
        above && below
    }

    /// Interval notation, e.g. `[0.49, 0.50)`.
    pub fn describe(&self) -> String {
        format!(
            "{}{}, {}{}",
            if self.lower_inclusive { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inclusive { ']' } else { ')' },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneTable {
    thresholds: ZoneThresholds,
    bands: [ZoneBand; 4],
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::build(ZoneThresholds::default())
    }
}

impl ZoneTable {
    /// Requires `0 <= very_high_below <= high_below <= medium_up_to <= 1`.
    pub fn new(thresholds: ZoneThresholds) -> RiskResult<Self> {
        let ZoneThresholds {
            very_high_below: t1,
            high_below: t2,
            medium_up_to: t3,
        } = thresholds;
        if t1 < Decimal::ZERO || t3 > Decimal::ONE || t1 > t2 || t2 > t3 {
            return Err(RiskError::Configuration(format!(
                "zone thresholds must satisfy 0 <= {t1} <= {t2} <= {t3} <= 1"
            )));
        }
        Ok(Self::build(thresholds))
    }

    fn build(thresholds: ZoneThresholds) -> Self {
        let ZoneThresholds {
            very_high_below: t1,
            high_below: t2,
            medium_up_to: t3,
        } = thresholds;
        let band = |lower, lower_inclusive, upper, upper_inclusive, zone| ZoneBand {
            lower,
            lower_inclusive,
            upper,
            upper_inclusive,
            zone,
        };
        Self {
            thresholds,
            bands: [
                band(Decimal::ZERO, true, t1, false, RiskZone::VeryHighRisk),
                band(t1, true, t2, false, RiskZone::HighRisk),
                band(t2, true, t3, true, RiskZone::MediumRisk),
                band(t3, false, Decimal::ONE, true, RiskZone::VeryLowRisk),
            ],
        }
    }

    pub fn thresholds(&self) -> &ZoneThresholds {
        &self.thresholds
    }

    pub fn bands(&self) -> &[ZoneBand] {
        &self.bands
    }

    /// Classify a probability. Values outside [0, 1] are a range error.
    pub fn classify(&self, probability: Rate) -> RiskResult<RiskZone> {
        self.bands
            .iter()
            .find(|b| b.contains(probability))
            .map(|b| b.zone)
            .ok_or(RiskError::ProbabilityOutOfRange { value: probability })
    }
}

/// Classify with the default thresholds.
pub fn classify_probability(probability: Rate) -> RiskResult<RiskZone> {
    ZoneTable::default().classify(probability)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
