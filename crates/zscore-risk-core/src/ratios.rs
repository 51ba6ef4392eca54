//! Ratio derivation: raw statement line items → X1..X5.
//!
//! - X1 = (current assets − current liabilities) / total assets
//! - X2 = retained earnings (or shareholders' equity) / total assets
//! - X3 = EBIT / total assets
//! - X4 = (stock price × shares outstanding) / total liabilities (or long-term debt)
//! - X5 = total sales / total assets
//!
//! Placeholder denominators are only ever substituted for *absent* values
//! and every substitution is reported back to the caller.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::record::{FinancialRecord, RatioVector};
use crate::types::Money;
use crate::{RiskError, RiskResult};

/// Placeholder used by the interactive profile for absent denominators.
pub const DEFAULT_DENOMINATOR_PLACEHOLDER: Decimal = dec!(1.0);

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Which balance-sheet line is the X4 denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeverageDenominator {
    #[default]
    TotalLiabilities,
    LongTermDebt,
}

impl LeverageDenominator {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::TotalLiabilities => "total_liabilities",
            Self::LongTermDebt => "long_term_debt",
        }
    }
}

/// Which line is the X2 numerator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsMeasure {
    #[default]
    RetainedEarnings,
    ShareholdersEquity,
}

impl EarningsMeasure {
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::RetainedEarnings => "retained_earnings",
            Self::ShareholdersEquity => "shareholders_equity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationConfig {
    pub leverage_denominator: LeverageDenominator,
    pub earnings_measure: EarningsMeasure,
    /// Substituted when total assets are absent. `None` makes them required.
    pub total_assets_default: Option<Money>,
    /// Substituted when the X4 denominator is absent.
    pub leverage_default: Option<Money>,
}

impl DerivationConfig {
    /// Every field required, no placeholders. Batch default.
    pub fn strict() -> Self {
        Self::default()
    }

    /// Placeholder 1.0 for absent total assets and X4 denominator, matching
    /// single-record data entry where those fields start unset.
    pub fn interactive() -> Self {
        Self {
            total_assets_default: Some(DEFAULT_DENOMINATOR_PLACEHOLDER),
            leverage_default: Some(DEFAULT_DENOMINATOR_PLACEHOLDER),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioSource {
    /// X1..X5 came with the record.
    Supplied,
    /// Computed from raw line items.
    Derived,
}

/// A placeholder that stood in for an absent input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub field: String,
    pub value: Money,
}

impl std::fmt::Display for Substitution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} was not supplied; placeholder {} used as denominator",
            self.field, self.value
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    pub ratios: RatioVector,
    pub source: RatioSource,
    pub substitutions: Vec<Substitution>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive the five ratios for one record.
///
/// Supplied X1..X5 take precedence over raw fields. Otherwise every raw
/// input is required, apart from denominators with a configured placeholder.
pub fn derive_ratios(
    record: &FinancialRecord,
    config: &DerivationConfig,
) -> RiskResult<Derivation> {
    if let Some(ratios) = record.supplied_ratios() {
        return Ok(Derivation {
            ratios,
            source: RatioSource::Supplied,
            substitutions: Vec::new(),
        });
    }

    let mut substitutions = Vec::new();

    let total_assets = denominator(
        record.total_assets,
        "total_assets",
        config.total_assets_default,
        &mut substitutions,
    )?;
    let leverage_field = config.leverage_denominator.field_name();
    let leverage = denominator(
        match config.leverage_denominator {
            LeverageDenominator::TotalLiabilities => record.total_liabilities,
            LeverageDenominator::LongTermDebt => record.long_term_debt,
        },
        leverage_field,
        config.leverage_default,
        &mut substitutions,
    )?;

    for sub in &substitutions {
        warn!(
            ticker = %record.ticker,
            fiscal_year = record.fiscal_year,
            field = %sub.field,
            value = %sub.value,
            "denominator placeholder substituted"
        );
    }

    let current_assets = required(record.current_assets, "current_assets")?;
    let current_liabilities = required(record.current_liabilities, "current_liabilities")?;
    let earnings = required(
        match config.earnings_measure {
            EarningsMeasure::RetainedEarnings => record.retained_earnings,
            EarningsMeasure::ShareholdersEquity => record.shareholders_equity,
        },
        config.earnings_measure.field_name(),
    )?;
    let ebit = required(record.ebit, "ebit")?;
    let stock_price = required(record.stock_price, "stock_price")?;
    let shares_outstanding = required(record.shares_outstanding, "shares_outstanding")?;
    let total_sales = required(record.total_sales, "total_sales")?;

    let working_capital = current_assets
        .checked_sub(current_liabilities)
        .ok_or_else(|| overflow("working_capital"))?;
    let market_value = stock_price
        .checked_mul(shares_outstanding)
        .ok_or_else(|| overflow("market_value_of_equity"))?;

    let x1 = safe_divide(
        working_capital,
        total_assets,
        "X1: Working Capital / Total Assets",
    )?;
    let x2 = safe_divide(
        earnings,
        total_assets,
        match config.earnings_measure {
            EarningsMeasure::RetainedEarnings => "X2: Retained Earnings / Total Assets",
            EarningsMeasure::ShareholdersEquity => "X2: Shareholders' Equity / Total Assets",
        },
    )?;
    let x3 = safe_divide(ebit, total_assets, "X3: EBIT / Total Assets")?;
    let x4 = safe_divide(
        market_value,
        leverage,
        match config.leverage_denominator {
            LeverageDenominator::TotalLiabilities => {
                "X4: Market Value of Equity / Total Liabilities"
            }
            LeverageDenominator::LongTermDebt => "X4: Market Value of Equity / Long-Term Debt",
        },
    )?;
    let x5 = safe_divide(total_sales, total_assets, "X5: Sales / Total Assets")?;

    Ok(Derivation {
        ratios: RatioVector::new(x1, x2, x3, x4, x5),
        source: RatioSource::Derived,
        substitutions,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn required(value: Option<Money>, field: &str) -> RiskResult<Money> {
    value.ok_or_else(|| RiskError::MissingField {
        field: field.to_string(),
    })
}

fn denominator(
    value: Option<Money>,
    field: &str,
    placeholder: Option<Money>,
    substitutions: &mut Vec<Substitution>,
) -> RiskResult<Money> {
    match (value, placeholder) {
        (Some(v), _) => Ok(v),
        (None, Some(p)) => {
            substitutions.push(Substitution {
                field: field.to_string(),
                value: p,
            });
            Ok(p)
        }
        (None, None) => required(None, field),
    }
}

fn safe_divide(numerator: Decimal, denominator: Decimal, context: &str) -> RiskResult<Decimal> {
    if denominator.is_zero() {
        return Err(RiskError::DivisionByZero {
            context: context.to_string(),
        });
    }
    numerator
        .checked_div(denominator)
        .ok_or_else(|| overflow(context))
}

pub(crate) fn overflow(field: &str) -> RiskError {
    RiskError::InvalidInput {
        field: field.to_string(),
        reason: "value overflows decimal range".into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// A healthy company with every raw field present.
    fn full_record() -> FinancialRecord {
        FinancialRecord {
            current_assets: Some(dec!(500)),
            current_liabilities: Some(dec!(300)),
            total_assets: Some(dec!(1000)),
            retained_earnings: Some(dec!(100)),
            shareholders_equity: Some(dec!(450)),
            ebit: Some(dec!(50)),
            total_sales: Some(dec!(400)),
            total_liabilities: Some(dec!(500)),
            long_term_debt: Some(dec!(250)),
            stock_price: Some(dec!(15)),
            shares_outstanding: Some(dec!(10)),
            ..FinancialRecord::new("ACME", 2019)
        }
    }

    #[test]
    fn test_x1_exact() {
        let d = derive_ratios(&full_record(), &DerivationConfig::strict()).unwrap();
        // (500 - 300) / 1000 = 0.2
        assert_eq!(d.ratios.x1, dec!(0.2));
        assert_eq!(d.source, RatioSource::Derived);
        assert!(d.substitutions.is_empty());
    }

    #[test]
    fn test_all_ratios() {
        let d = derive_ratios(&full_record(), &DerivationConfig::strict()).unwrap();
        assert_eq!(d.ratios.x2, dec!(0.1));
        assert_eq!(d.ratios.x3, dec!(0.05));
        // 15 * 10 / 500 = 0.3
        assert_eq!(d.ratios.x4, dec!(0.3));
        assert_eq!(d.ratios.x5, dec!(0.4));
    }

    #[test]
    fn test_long_term_debt_denominator() {
        let config = DerivationConfig {
            leverage_denominator: LeverageDenominator::LongTermDebt,
            ..DerivationConfig::strict()
        };
        let d = derive_ratios(&full_record(), &config).unwrap();
        // 150 / 250 = 0.6
        assert_eq!(d.ratios.x4, dec!(0.6));
    }

    #[test]
    fn test_shareholders_equity_numerator() {
        let config = DerivationConfig {
            earnings_measure: EarningsMeasure::ShareholdersEquity,
            ..DerivationConfig::strict()
        };
        let d = derive_ratios(&full_record(), &config).unwrap();
        assert_eq!(d.ratios.x2, dec!(0.45));
    }

    #[test]
    fn test_x2_error_names_configured_numerator() {
        let mut record = full_record();
        record.total_assets = Some(dec!(0.1));
        record.shareholders_equity = Some(Decimal::MAX);
        let config = DerivationConfig {
            earnings_measure: EarningsMeasure::ShareholdersEquity,
            ..DerivationConfig::strict()
        };
        match derive_ratios(&record, &config).unwrap_err() {
            RiskError::InvalidInput { field, .. } => {
                assert_eq!(field, "X2: Shareholders' Equity / Total Assets")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_total_assets_without_placeholder() {
        let mut record = full_record();
        record.total_assets = Some(Decimal::ZERO);
        let err = derive_ratios(&record, &DerivationConfig::strict()).unwrap_err();
        match err {
            RiskError::DivisionByZero { context } => assert!(context.starts_with("X1")),
            other => panic!("Expected DivisionByZero, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_total_assets_not_replaced_by_placeholder() {
        // Placeholders only stand in for absent values, never for an explicit zero.
        let mut record = full_record();
        record.total_assets = Some(Decimal::ZERO);
        let err = derive_ratios(&record, &DerivationConfig::interactive()).unwrap_err();
        assert!(matches!(err, RiskError::DivisionByZero { .. }));
    }

    #[test]
    fn test_absent_total_assets_uses_placeholder() {
        let mut record = full_record();
        record.total_assets = None;
        let d = derive_ratios(&record, &DerivationConfig::interactive()).unwrap();
        // (500 - 300) / 1.0
        assert_eq!(d.ratios.x1, dec!(200));
        assert_eq!(
            d.substitutions,
            vec![Substitution {
                field: "total_assets".into(),
                value: dec!(1.0),
            }]
        );
    }

    #[test]
    fn test_absent_total_assets_strict_is_missing_field() {
        let mut record = full_record();
        record.total_assets = None;
        match derive_ratios(&record, &DerivationConfig::strict()).unwrap_err() {
            RiskError::MissingField { field } => assert_eq!(field, "total_assets"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_placeholder_still_divides_by_zero() {
        let mut record = full_record();
        record.total_liabilities = None;
        let config = DerivationConfig {
            leverage_default: Some(Decimal::ZERO),
            ..DerivationConfig::strict()
        };
        let err = derive_ratios(&record, &config).unwrap_err();
        match err {
            RiskError::DivisionByZero { context } => assert!(context.starts_with("X4")),
            other => panic!("Expected DivisionByZero, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_numerator_field() {
        let mut record = full_record();
        record.ebit = None;
        match derive_ratios(&record, &DerivationConfig::interactive()).unwrap_err() {
            RiskError::MissingField { field } => assert_eq!(field, "ebit"),
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_supplied_ratios_take_precedence() {
        let supplied = RatioVector::new(dec!(0.2), dec!(0.1), dec!(0.05), dec!(0.3), dec!(0.4));
        let record = FinancialRecord::new("ACME", 2019).with_ratios(supplied);
        let d = derive_ratios(&record, &DerivationConfig::strict()).unwrap();
        assert_eq!(d.ratios, supplied);
        assert_eq!(d.source, RatioSource::Supplied);
    }

    #[test]
    fn test_negative_working_capital() {
        let mut record = full_record();
        record.current_liabilities = Some(dec!(700));
        let d = derive_ratios(&record, &DerivationConfig::strict()).unwrap();
        assert_eq!(d.ratios.x1, dec!(-0.2));
    }

    #[test]
    fn test_config_deserialises_with_defaults() {
        let config: DerivationConfig =
            serde_json::from_str(r#"{"leverage_denominator":"long_term_debt"}"#).unwrap();
        assert_eq!(config.leverage_denominator, LeverageDenominator::LongTermDebt);
        assert_eq!(config.earnings_measure, EarningsMeasure::RetainedEarnings);
        assert_eq!(config.total_assets_default, None);
    }
}
