// search.rs
use crate::config::AppConfig;
use crate::db::{Database, SqliteHistory, SqliteSink};
use crate::domain::SearchCriteria;
use crate::errors::ServerError;
use crate::pipeline::{BatchReport, CancelFlag, Pipeline, RunOutput};
use crate::providers::{default_waterfall, HttpFetcher, ListingSearch, ProviderError, ZillowClient};
use tracing::info;

pub struct SearchOutcome {
    pub search_location: String,
    pub output: RunOutput,
    /// `None` when the caller did not ask for persistence.
    pub report: Option<BatchReport>,
}

/// Bulk search feeding the pipeline, with optional persistence.
pub struct SearchService {
    search: Box<dyn ListingSearch>,
    pipeline: Pipeline,
}

impl SearchService {
    pub fn new(search: Box<dyn ListingSearch>, pipeline: Pipeline) -> Self {
        Self { search, pipeline }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let http = HttpFetcher::new(&config.http)?;
        let zillow = ZillowClient::new(http.clone(), config.zillow_api_key.clone());
        let resolver = default_waterfall(&http, config.realtor_api_key.clone());

        Ok(Self::new(
            Box::new(zillow),
            Pipeline::new(resolver, config.pipeline.clone()),
        ))
    }

    pub fn is_search_configured(&self) -> bool {
        self.search.is_configured()
    }

    pub fn run(
        &self,
        db: &Database,
        criteria: &SearchCriteria,
        save: bool,
        cancel: &CancelFlag,
    ) -> Result<SearchOutcome, ServerError> {
        let location = criteria.location.trim();
        if location.is_empty() {
            return Err(ServerError::BadRequest("location is required".into()));
        }

        let listings = self.search.search(criteria)?;

        let mut history = SqliteHistory::new(db.clone());
        let output = self.pipeline.run(&listings, &history, location, cancel);

        let report = save.then(|| {
            let mut sink = SqliteSink::new(db.clone());
            self.pipeline.persist(&output, &mut sink, &mut history)
        });

        info!(
            %location,
            emitted = output.outcomes.len(),
            skipped = output.skipped.len(),
            degraded = output.degraded_count(),
            saved = save,
            "search finished"
        );

        Ok(SearchOutcome {
            search_location: location.to_string(),
            output,
            report,
        })
    }
}
