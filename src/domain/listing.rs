// src/domain/listing.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which provider produced a listing snapshot or a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Zillow,
    Realtor,
    Redfin,
    None,
}

impl SourceTag {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceTag::Zillow => "zillow",
            SourceTag::Realtor => "realtor",
            SourceTag::Redfin => "redfin",
            SourceTag::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl Address {
    /// "123 Main St, Marietta, GA 30008"
    pub fn full(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip)
            .trim()
            .to_string()
    }

    pub fn key(&self) -> String {
        normalize_address(&self.full())
    }
}

/// Lowercase and collapse runs of whitespace. Two addresses are the same
/// listing only if their normalized forms are byte-equal.
pub fn normalize_address(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One sample of a value history chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Unix epoch milliseconds.
    pub date_ms: i64,
    pub value: f64,
}

/// A listing snapshot as returned by the primary search.
/// Nothing downstream mutates it within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub source: SourceTag,
    /// Provider-side id (zpid for Zillow).
    pub provider_id: Option<String>,
    pub address: Address,

    pub list_price: Option<Decimal>,
    pub beds: Option<u32>,
    pub baths: Option<f64>,
    pub sqft: Option<u32>,

    /// After-repair value estimate (Zestimate).
    pub arv: Option<Decimal>,
    pub rent_estimate: Option<Decimal>,
    pub description: Option<String>,
    #[serde(default)]
    pub price_trend: Vec<TrendPoint>,
}

impl RawListing {
    pub fn new(source: SourceTag, address: Address) -> Self {
        Self {
            source,
            provider_id: None,
            address,
            list_price: None,
            beds: None,
            baths: None,
            sqft: None,
            arv: None,
            rent_estimate: None,
            description: None,
            price_trend: Vec::new(),
        }
    }

    pub fn price_per_sqft(&self) -> Option<Decimal> {
        let price = self.list_price?;
        let sqft = self.sqft.filter(|s| *s > 0)?;
        Some((price / Decimal::from(sqft)).round_dp(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(street: &str) -> Address {
        Address {
            street: street.to_string(),
            city: "Marietta".to_string(),
            state: "GA".to_string(),
            zip: "30008".to_string(),
        }
    }

    #[test]
    fn address_key_ignores_case_and_spacing() {
        let a = address("2598 Hencley Cir SW");
        let b = address("2598   HENCLEY cir  sw");
        assert_eq!(a.key(), b.key());
        assert_eq!(a.key(), "2598 hencley cir sw, marietta, ga 30008");
    }

    #[test]
    fn address_key_is_not_fuzzy() {
        let a = address("2598 Hencley Cir SW");
        let b = address("2598 Hencley Circle SW");
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn price_per_sqft_needs_positive_sqft() {
        let mut listing = RawListing::new(SourceTag::Zillow, address("1 Main"));
        listing.list_price = Some(Decimal::from(150_000));
        assert_eq!(listing.price_per_sqft(), None);

        listing.sqft = Some(0);
        assert_eq!(listing.price_per_sqft(), None);

        listing.sqft = Some(1_500);
        assert_eq!(listing.price_per_sqft(), Some(Decimal::from(100)));
    }
}
