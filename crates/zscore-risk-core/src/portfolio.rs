//! Industry → company → year-range drill-down over scored records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::evaluate::ScoredRecord;
use crate::types::Rate;
use crate::zones::RiskZone;
use crate::{RiskError, RiskResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendQuery {
    pub industry: String,
    pub ticker: String,
    /// Inclusive. Defaults to the company's first year.
    #[serde(default)]
    pub from_year: Option<i32>,
    /// Inclusive. Defaults to the company's last year.
    #[serde(default)]
    pub to_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(rename = "fyear")]
    pub fiscal_year: i32,
    pub lda_probability: Rate,
    pub risk_zone: RiskZone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyTrend {
    pub ticker: String,
    pub industry: String,
    pub from_year: i32,
    pub to_year: i32,
    pub points: Vec<TrendPoint>,
    pub latest_zone: RiskZone,
    pub min_probability: Rate,
    pub max_probability: Rate,
    /// Last probability minus first.
    pub probability_change: Decimal,
}

/// Read-only view over a scored portfolio.
pub struct PortfolioView<'a> {
    records: &'a [ScoredRecord],
}

impl<'a> PortfolioView<'a> {
    pub fn new(records: &'a [ScoredRecord]) -> Self {
        Self { records }
    }

    /// Distinct industries, matched case-insensitively. Each keeps the
    /// spelling it first appears with.
    pub fn industries(&self) -> Vec<String> {
        let mut seen: BTreeMap<String, String> = BTreeMap::new();
        for industry in self.records.iter().filter_map(|r| r.record.industry.as_deref()) {
            let name = industry.trim();
            seen.entry(name.to_ascii_lowercase()).or_insert_with(|| name.to_string());
        }
        seen.into_values().collect()
    }

    pub fn tickers(&self, industry: &str) -> Vec<String> {
        self.in_industry(industry)
            .map(|r| r.record.ticker.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn year_range(&self, industry: &str, ticker: &str) -> Option<(i32, i32)> {
        let years = self.company(industry, ticker).map(|r| r.record.fiscal_year);
        years.fold(None, |acc, y| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }

    pub fn company_trend(&self, query: &TrendQuery) -> RiskResult<CompanyTrend> {
        let (first, last) = self
            .year_range(&query.industry, &query.ticker)
            .ok_or_else(|| {
                RiskError::InsufficientData(format!(
                    "no scored records for {} in industry {}",
                    query.ticker, query.industry
                ))
            })?;
        let from_year = query.from_year.unwrap_or(first);
        let to_year = query.to_year.unwrap_or(last);
        if from_year > to_year {
            return Err(RiskError::InvalidInput {
                field: "from_year".into(),
                reason: format!("{from_year} is after to_year {to_year}"),
            });
        }

        let mut points: Vec<TrendPoint> = self
            .company(&query.industry, &query.ticker)
            .filter(|r| (from_year..=to_year).contains(&r.record.fiscal_year))
            .map(|r| TrendPoint {
                fiscal_year: r.record.fiscal_year,
                lda_probability: r.lda_probability,
                risk_zone: r.risk_zone,
            })
            .collect();
        points.sort_by_key(|p| p.fiscal_year);

        let (head, tail) = match (points.first(), points.last()) {
            (Some(h), Some(t)) => (h.clone(), t.clone()),
            _ => {
                return Err(RiskError::InsufficientData(format!(
                    "no scored records for {} between {} and {}",
                    query.ticker, from_year, to_year
                )))
            }
        };
        let (min_probability, max_probability) = points.iter().fold(
            (head.lda_probability, head.lda_probability),
            |(lo, hi), p| (lo.min(p.lda_probability), hi.max(p.lda_probability)),
        );

        Ok(CompanyTrend {
            ticker: query.ticker.clone(),
            industry: query.industry.clone(),
            from_year,
            to_year,
            latest_zone: tail.risk_zone,
            min_probability,
            max_probability,
            probability_change: tail.lda_probability - head.lda_probability,
            points,
        })
    }

    fn in_industry<'b>(
        &'b self,
        industry: &'b str,
    ) -> impl Iterator<Item = &'a ScoredRecord> + 'b {
        self.records.iter().filter(move |r| {
            r.record
                .industry
                .as_deref()
                .is_some_and(|i| i.trim().eq_ignore_ascii_case(industry.trim()))
        })
    }

    fn company<'b>(
        &'b self,
        industry: &'b str,
        ticker: &'b str,
    ) -> impl Iterator<Item = &'a ScoredRecord> + 'b {
        self.in_industry(industry)
            .filter(move |r| r.record.ticker.eq_ignore_ascii_case(ticker.trim()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
