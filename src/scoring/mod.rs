pub mod deal;
pub mod rental;
pub mod trend;

pub use deal::{assess_deal, DealAssessment, DealGrade, RehabTier, ScenarioResult, Scenarios};
pub use rental::{assess_rental, RentalAssessment, RentalAssumptions, RentalGrade};
pub use trend::{analyze_trend, TrendAnalysis, TrendDirection};

use crate::domain::RawListing;
use crate::enrich::KeywordMatch;

/// Both investment views of one listing. Each is computed independently.
pub fn score(
    listing: &RawListing,
    keywords: &KeywordMatch,
    rental: &RentalAssumptions,
) -> (DealAssessment, Option<RentalAssessment>) {
    (
        assess_deal(listing, keywords),
        assess_rental(listing.list_price, listing.rent_estimate, rental),
    )
}
