// src/domain/record.rs

use crate::domain::RawListing;
use crate::enrich::{KeywordMatch, ResolvedDescription};
use crate::scoring::{DealAssessment, RehabTier, RentalAssessment, TrendAnalysis};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Persisted column order. Sinks write `AnalysisRecord::cells` 1:1 against
/// this header.
pub const RECORD_COLUMNS: [&str; 33] = [
    "Date Pulled",
    "Search Location",
    "Rank",
    "Address",
    "City",
    "State",
    "ZIP",
    "List Price",
    "Beds",
    "Baths",
    "Sqft",
    "Price/Sqft",
    "Zestimate (ARV)",
    "MAO Light ($25/sqft)",
    "MAO Medium ($40/sqft)",
    "MAO Heavy ($60/sqft)",
    "Profit Light",
    "Profit Medium",
    "Profit Heavy",
    "Best Scenario",
    "Best Profit",
    "Is Fixer?",
    "Keywords Found",
    "Deal Score",
    "Deal Grade",
    "Recommendation",
    "Monthly Rent",
    "Cash Flow",
    "Cash-on-Cash %",
    "Cap Rate %",
    "Price Trend",
    "1-Year Change %",
    "Error",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    fn money(d: Option<Decimal>) -> Self {
        d.and_then(|d| d.round_dp(2).to_f64())
            .map(Cell::Number)
            .unwrap_or(Cell::Empty)
    }

    fn number(n: Option<f64>) -> Self {
        n.map(Cell::Number).unwrap_or(Cell::Empty)
    }
}

/// One finalized row. Built once by the pipeline, never modified after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub record_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub search_location: String,
    /// 1-based position in the run's output, which follows input order.
    pub rank: usize,
    /// Position in the batch handed to the pipeline.
    pub input_index: usize,
    pub address_key: String,

    pub listing: RawListing,
    pub description: ResolvedDescription,
    pub keywords: KeywordMatch,
    pub deal: DealAssessment,
    pub rental: Option<RentalAssessment>,
    pub trend: Option<TrendAnalysis>,

    /// Set on degraded records.
    pub error: Option<String>,
}

/// Hex SHA-256 of address, search and timestamp.
pub fn record_id(address_key: &str, search_location: &str, analyzed_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(address_key.as_bytes());
    hasher.update(b"|");
    hasher.update(search_location.as_bytes());
    hasher.update(b"|");
    hasher.update(analyzed_at.to_rfc3339().as_bytes());
    format!("{:x}", hasher.finalize())
}

impl AnalysisRecord {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    pub fn cells(&self) -> Vec<Cell> {
        let l = &self.listing;
        let scenarios = self.deal.scenarios.as_ref();
        let tier = |t: RehabTier| scenarios.map(|s| s.get(t));
        let rental = self.rental.as_ref();
        let trend = self.trend.as_ref();

        vec![
            Cell::text(self.analyzed_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::text(&self.search_location),
            Cell::Number(self.rank as f64),
            Cell::text(&l.address.street),
            Cell::text(&l.address.city),
            Cell::text(&l.address.state),
            Cell::text(&l.address.zip),
            Cell::money(l.list_price),
            Cell::number(l.beds.map(f64::from)),
            Cell::number(l.baths),
            Cell::number(l.sqft.map(f64::from)),
            Cell::money(l.price_per_sqft()),
            Cell::money(l.arv),
            Cell::money(tier(RehabTier::Light).map(|r| r.mao)),
            Cell::money(tier(RehabTier::Medium).map(|r| r.mao)),
            Cell::money(tier(RehabTier::Heavy).map(|r| r.mao)),
            Cell::money(tier(RehabTier::Light).map(|r| r.profit)),
            Cell::money(tier(RehabTier::Medium).map(|r| r.profit)),
            Cell::money(tier(RehabTier::Heavy).map(|r| r.profit)),
            scenarios
                .map(|s| Cell::text(s.best.label()))
                .unwrap_or(Cell::Empty),
            Cell::money(scenarios.map(|s| s.best_profit)),
            Cell::text(if self.keywords.is_fixer() { "Yes" } else { "No" }),
            Cell::text(self.keywords.joined()),
            Cell::number(self.deal.score.map(f64::from)),
            Cell::text(self.deal.grade.label()),
            Cell::text(&self.deal.recommendation),
            Cell::number(rental.map(|r| r.monthly_rent)),
            Cell::number(rental.map(|r| r.monthly_cash_flow)),
            Cell::number(rental.map(|r| r.cash_on_cash_pct)),
            Cell::number(rental.map(|r| r.cap_rate_pct)),
            trend
                .map(|t| Cell::text(t.direction.label()))
                .unwrap_or(Cell::Empty),
            Cell::number(trend.map(|t| t.one_year_change_pct)),
            self.error.as_deref().map(Cell::text).unwrap_or(Cell::Empty),
        ]
    }
}
