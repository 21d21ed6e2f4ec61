pub mod errors;
pub mod freshness;
pub mod orchestrator;

pub use errors::{ListingError, PersistenceError};
pub use freshness::{FreshnessGate, HistoryStore, MemoryHistory, DEFAULT_FRESHNESS_DAYS};
pub use orchestrator::{
    BatchReport, CancelFlag, Clock, FailedWrite, ListingOutcome, MemorySink, Pipeline,
    PipelineConfig, RecordSink, RunOutput, SkipReason, SkippedListing, SystemClock,
};
