pub mod criteria;
pub mod listing;
pub mod record;

pub use criteria::SearchCriteria;
pub use listing::{normalize_address, Address, RawListing, SourceTag, TrendPoint};
pub use record::{record_id, AnalysisRecord, Cell, RECORD_COLUMNS};
