// src/scoring/deal.rs

use crate::domain::RawListing;
use crate::enrich::KeywordMatch;
use crate::pipeline::ListingError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fraction of ARV an investor pays before rehab (the 70% rule).
pub fn arv_multiplier() -> Decimal {
    Decimal::new(70, 2)
}

/// Rehab scope. Declaration order is the tie-break priority: cheaper wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RehabTier {
    Light,
    Medium,
    Heavy,
}

impl RehabTier {
    pub const ALL: [RehabTier; 3] = [RehabTier::Light, RehabTier::Medium, RehabTier::Heavy];

    pub fn cost_per_sqft(self) -> Decimal {
        match self {
            RehabTier::Light => Decimal::from(25),
            RehabTier::Medium => Decimal::from(40),
            RehabTier::Heavy => Decimal::from(60),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RehabTier::Light => "Light",
            RehabTier::Medium => "Medium",
            RehabTier::Heavy => "Heavy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub tier: RehabTier,
    pub cost_per_sqft: Decimal,
    pub mao: Decimal,
    pub profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenarios {
    /// Light, medium, heavy.
    pub results: [ScenarioResult; 3],
    pub best: RehabTier,
    pub best_profit: Decimal,
}

impl Scenarios {
    pub fn get(&self, tier: RehabTier) -> &ScenarioResult {
        match tier {
            RehabTier::Light => &self.results[0],
            RehabTier::Medium => &self.results[1],
            RehabTier::Heavy => &self.results[2],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealGrade {
    Excellent,
    Good,
    Fair,
    Poor,
    InsufficientData,
}

impl DealGrade {
    pub fn from_score(score: u8) -> Self {
        match score {
            9..=10 => DealGrade::Excellent,
            7..=8 => DealGrade::Good,
            5..=6 => DealGrade::Fair,
            _ => DealGrade::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DealGrade::Excellent => "Excellent Deal",
            DealGrade::Good => "Good Deal",
            DealGrade::Fair => "Fair Deal",
            DealGrade::Poor => "Poor Deal",
            DealGrade::InsufficientData => "Insufficient Data",
        }
    }
}

/// Fix-and-flip view of a listing. When price, ARV or square footage is
/// missing, `scenarios` and `score` are `None` and the grade says so.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealAssessment {
    pub scenarios: Option<Scenarios>,
    pub score: Option<u8>,
    pub grade: DealGrade,
    pub recommendation: String,
}

impl DealAssessment {
    pub fn insufficient() -> Self {
        Self {
            scenarios: None,
            score: None,
            grade: DealGrade::InsufficientData,
            recommendation: INSUFFICIENT_RECOMMENDATION.to_string(),
        }
    }
}

pub const INSUFFICIENT_RECOMMENDATION: &str = "Insufficient Data - Verify Listing";

/// Upper profit bound (inclusive for the non-positive bands, exclusive
/// above zero) for each score. Anything past the last bound scores 10.
const PROFIT_BANDS: [(i64, u8); 9] = [
    (-50_000, 1),
    (-20_000, 2),
    (0, 3),
    (10_000, 4),
    (20_000, 5),
    (30_000, 6),
    (45_000, 7),
    (60_000, 8),
    (80_000, 9),
];

pub fn compute_scenarios(
    arv: Decimal,
    sqft: u32,
    list_price: Decimal,
) -> Result<Scenarios, ListingError> {
    if sqft == 0 {
        return Err(ListingError::InsufficientListingData("sqft is zero"));
    }
    if arv <= Decimal::ZERO {
        return Err(ListingError::InsufficientListingData("arv is not positive"));
    }

    let sqft = Decimal::from(sqft);
    let results = RehabTier::ALL.map(|tier| {
        let cost_per_sqft = tier.cost_per_sqft();
        let mao = arv * arv_multiplier() - sqft * cost_per_sqft;
        ScenarioResult {
            tier,
            cost_per_sqft,
            mao,
            profit: mao - list_price,
        }
    });

    let best = pick_best(&results);
    let (best_tier, best_profit) = (best.tier, best.profit);

    Ok(Scenarios {
        results,
        best: best_tier,
        best_profit,
    })
}

/// Highest profit wins; strict comparison keeps the earlier (cheaper) tier
/// on ties.
fn pick_best(results: &[ScenarioResult; 3]) -> &ScenarioResult {
    let mut best = &results[0];
    for candidate in &results[1..] {
        if candidate.profit > best.profit {
            best = candidate;
        }
    }
    best
}

/// Maps best-case profit to 1..=10. Non-positive profit never scores above
/// 3; a positive-profit fixer gets one bonus point.
pub fn deal_score(best_profit: Decimal, is_fixer: bool) -> u8 {
    let profit = best_profit.floor();
    let mut score = 10;

    for (i, (bound, band_score)) in PROFIT_BANDS.iter().enumerate() {
        let bound = Decimal::from(*bound);
        // Bands up to and including zero are closed above.
        let inside = if i <= 2 { profit <= bound } else { profit < bound };
        if inside {
            score = *band_score;
            break;
        }
    }

    if is_fixer && best_profit > Decimal::ZERO {
        score = (score + 1).min(10);
    }
    score
}

pub fn recommendation(score: u8, is_fixer: bool, best: RehabTier) -> String {
    match (score, is_fixer) {
        (9..=10, _) => "Strong Buy - Analyze Further".to_string(),
        (7..=8, true) => format!("Buy - Verify {} Rehab Scope", best.label()),
        (7..=8, false) => "Buy - Confirm ARV With Comps".to_string(),
        (5..=6, true) => "Consider - Inspect Condition Before Offer".to_string(),
        (5..=6, false) => "Consider - Negotiate Below List".to_string(),
        _ => "Pass - Insufficient Margin".to_string(),
    }
}

pub fn assess_deal(listing: &RawListing, keywords: &KeywordMatch) -> DealAssessment {
    let inputs = match (listing.arv, listing.sqft, listing.list_price) {
        (Some(arv), Some(sqft), Some(price)) => compute_scenarios(arv, sqft, price),
        (None, _, _) => Err(ListingError::InsufficientListingData("arv missing")),
        (_, None, _) => Err(ListingError::InsufficientListingData("sqft missing")),
        (_, _, None) => Err(ListingError::InsufficientListingData("list price missing")),
    };

    let scenarios = match inputs {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(address = %listing.address.full(), error = %e, "deal not scored");
            return DealAssessment::insufficient();
        }
    };

    let score = deal_score(scenarios.best_profit, keywords.is_fixer());

    DealAssessment {
        recommendation: recommendation(score, keywords.is_fixer(), scenarios.best),
        grade: DealGrade::from_score(score),
        score: Some(score),
        scenarios: Some(scenarios),
    }
}
