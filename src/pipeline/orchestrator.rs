// src/pipeline/orchestrator.rs

use crate::domain::{record_id, AnalysisRecord, RawListing};
use crate::enrich::{detect, DescriptionResolver, KeywordMatch, ResolvedDescription};
use crate::pipeline::{FreshnessGate, HistoryStore, ListingError, PersistenceError};
use crate::scoring::{
    self, analyze_trend, DealAssessment, RentalAssessment, RentalAssumptions, TrendAnalysis,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::any::Any;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use tracing::{debug, error, info, warn};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Cooperative stop signal. A listing already being enriched runs to
/// completion; nothing new is started once raised.
#[derive(Debug, Default, Clone)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Listings enriched concurrently. 1 keeps everything on the caller's thread.
    pub workers: usize,
    pub freshness_days: i64,
    pub rental: RentalAssumptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            freshness_days: super::DEFAULT_FRESHNESS_DAYS,
            rental: RentalAssumptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListingOutcome {
    Complete(AnalysisRecord),
    /// A stage failed. The record carries identity fields and the error text
    /// but no scores.
    Degraded {
        record: AnalysisRecord,
        error: ListingError,
    },
}

impl ListingOutcome {
    pub fn record(&self) -> &AnalysisRecord {
        match self {
            ListingOutcome::Complete(record) | ListingOutcome::Degraded { record, .. } => record,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ListingOutcome::Degraded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    RecentlyAnalyzed,
    DuplicateInBatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedListing {
    pub input_index: usize,
    pub address: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default)]
pub struct RunOutput {
    /// Input order, ranks 1..=n.
    pub outcomes: Vec<ListingOutcome>,
    pub skipped: Vec<SkippedListing>,
    pub cancelled: bool,
}

impl RunOutput {
    pub fn records(&self) -> impl Iterator<Item = &AnalysisRecord> {
        self.outcomes.iter().map(ListingOutcome::record)
    }

    pub fn degraded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_degraded()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedWrite {
    pub record_id: String,
    pub error: String,
}

/// Per-record result of a persistence pass.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub persisted: Vec<String>,
    pub failed: Vec<FailedWrite>,
    pub history_errors: Vec<String>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.history_errors.is_empty()
    }
}

/// Durable destination for finalized records.
pub trait RecordSink {
    fn append(&mut self, record: &AnalysisRecord) -> Result<(), PersistenceError>;

    /// Writes each record independently; one failure does not stop the rest.
    fn append_batch(&mut self, records: &[&AnalysisRecord]) -> BatchReport {
        let mut report = BatchReport::default();
        for record in records {
            match self.append(record) {
                Ok(()) => report.persisted.push(record.record_id.clone()),
                Err(e) => {
                    error!(record_id = %record.record_id, error = %e, "record not persisted");
                    report.failed.push(FailedWrite {
                        record_id: record.record_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<AnalysisRecord>,
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &AnalysisRecord) -> Result<(), PersistenceError> {
        self.records.push(record.clone());
        Ok(())
    }
}

struct Analysis {
    description: ResolvedDescription,
    keywords: KeywordMatch,
    deal: DealAssessment,
    rental: Option<RentalAssessment>,
    trend: Option<TrendAnalysis>,
}

struct Draft<'a> {
    input_index: usize,
    listing: &'a RawListing,
    analyzed_at: DateTime<Utc>,
    result: Result<Analysis, ListingError>,
}

pub struct Pipeline {
    resolver: DescriptionResolver,
    gate: FreshnessGate,
    config: PipelineConfig,
    clock: Box<dyn Clock>,
}

impl Pipeline {
    pub fn new(resolver: DescriptionResolver, config: PipelineConfig) -> Self {
        Self {
            resolver,
            gate: FreshnessGate::new(config.freshness_days),
            config,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Analyze a batch. Gating and dedup run first in input order, then the
    /// admitted listings are enriched (possibly in parallel), then ranked.
    pub fn run(
        &self,
        listings: &[RawListing],
        history: &dyn HistoryStore,
        search_location: &str,
        cancel: &CancelFlag,
    ) -> RunOutput {
        let now = self.clock.now();
        let mut skipped = Vec::new();
        let mut seen = HashSet::new();
        let mut admitted = Vec::with_capacity(listings.len());

        for (index, listing) in listings.iter().enumerate() {
            let key = listing.address.key();

            let reason = if seen.contains(&key) {
                Some(SkipReason::DuplicateInBatch)
            } else if !self.gate.should_process(&key, history, now) {
                Some(SkipReason::RecentlyAnalyzed)
            } else {
                None
            };

            match reason {
                Some(reason) => {
                    debug!(address = %key, ?reason, "listing skipped");
                    skipped.push(SkippedListing {
                        input_index: index,
                        address: listing.address.full(),
                        reason,
                    });
                }
                None => admitted.push((index, listing)),
            }
            seen.insert(key);
        }

        info!(
            total = listings.len(),
            admitted = admitted.len(),
            skipped = skipped.len(),
            "starting enrichment"
        );

        let drafts = self.enrich_all(&admitted, cancel);
        let cancelled = drafts.len() < admitted.len();
        if cancelled {
            warn!(
                completed = drafts.len(),
                admitted = admitted.len(),
                "run cancelled, emitting completed listings only"
            );
        }

        let outcomes: Vec<ListingOutcome> = drafts
            .into_iter()
            .enumerate()
            .map(|(pos, draft)| finalize(draft, pos + 1, search_location))
            .collect();

        RunOutput {
            cancelled,
            outcomes,
            skipped,
        }
    }

    /// Write every emitted record, then mark fully analyzed ones as fresh.
    /// Degraded and unwritten records stay eligible for the next run.
    pub fn persist(
        &self,
        output: &RunOutput,
        sink: &mut dyn RecordSink,
        history: &mut dyn HistoryStore,
    ) -> BatchReport {
        let records: Vec<&AnalysisRecord> = output.records().collect();
        let mut report = sink.append_batch(&records);
        let written: HashSet<&str> = report.persisted.iter().map(String::as_str).collect();

        let mut history_errors = Vec::new();
        for outcome in &output.outcomes {
            let ListingOutcome::Complete(record) = outcome else {
                continue;
            };
            if !written.contains(record.record_id.as_str()) {
                continue;
            }
            if let Err(e) = history.record(&record.address_key, record.analyzed_at) {
                error!(address = %record.address_key, error = %e, "history not updated");
                history_errors.push(record.address_key.clone());
            }
        }
        report.history_errors = history_errors;

        info!(
            persisted = report.persisted.len(),
            failed = report.failed.len(),
            "persistence pass finished"
        );
        report
    }

    fn enrich_all<'a>(
        &self,
        admitted: &[(usize, &'a RawListing)],
        cancel: &CancelFlag,
    ) -> Vec<Draft<'a>> {
        let workers = self.config.workers.clamp(1, admitted.len().max(1));

        if workers == 1 {
            let mut drafts = Vec::with_capacity(admitted.len());
            for &(index, listing) in admitted {
                if cancel.is_cancelled() {
                    break;
                }
                drafts.push(self.draft(index, listing));
            }
            return drafts;
        }

        // Workers claim slots from a shared cursor, so completed slots always
        // form a prefix of `admitted` even when the run is cancelled.
        let cursor = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let cursor = &cursor;
                scope.spawn(move || loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let slot = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(&(index, listing)) = admitted.get(slot) else {
                        break;
                    };
                    if tx.send((slot, self.draft(index, listing))).is_err() {
                        break;
                    }
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<Draft<'a>>> = admitted.iter().map(|_| None).collect();
        for (slot, draft) in rx {
            slots[slot] = Some(draft);
        }
        slots.into_iter().map_while(|d| d).collect()
    }

    fn draft<'a>(&self, input_index: usize, listing: &'a RawListing) -> Draft<'a> {
        let analyzed_at = self.clock.now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.analyze(listing)))
            .unwrap_or_else(|payload| Err(ListingError::StagePanicked(panic_message(&payload))));

        if let Err(e) = &result {
            warn!(address = %listing.address.full(), error = %e, "listing degraded");
        }

        Draft {
            input_index,
            listing,
            analyzed_at,
            result,
        }
    }

    fn analyze(&self, listing: &RawListing) -> Result<Analysis, ListingError> {
        validate(listing)?;

        let description = self.resolver.resolve(listing);
        let keywords = detect(description.text());
        let (deal, rental) = scoring::score(listing, &keywords, &self.config.rental);
        let trend = analyze_trend(&listing.price_trend);

        Ok(Analysis {
            description,
            keywords,
            deal,
            rental,
            trend,
        })
    }
}

fn validate(listing: &RawListing) -> Result<(), ListingError> {
    if listing.address.street.trim().is_empty() {
        return Err(ListingError::InvalidListing("missing street address".into()));
    }
    if listing.list_price.is_some_and(|p| p < Decimal::ZERO) {
        return Err(ListingError::InvalidListing("negative list price".into()));
    }
    if listing.arv.is_some_and(|a| a < Decimal::ZERO) {
        return Err(ListingError::InvalidListing("negative value estimate".into()));
    }
    Ok(())
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

fn finalize(draft: Draft<'_>, rank: usize, search_location: &str) -> ListingOutcome {
    let address_key = draft.listing.address.key();
    let mut record = AnalysisRecord {
        record_id: record_id(&address_key, search_location, draft.analyzed_at),
        analyzed_at: draft.analyzed_at,
        search_location: search_location.to_string(),
        rank,
        input_index: draft.input_index,
        address_key,
        listing: draft.listing.clone(),
        description: ResolvedDescription::empty(),
        keywords: KeywordMatch::default(),
        deal: DealAssessment::insufficient(),
        rental: None,
        trend: None,
        error: None,
    };

    match draft.result {
        Ok(a) => {
            record.description = a.description;
            record.keywords = a.keywords;
            record.deal = a.deal;
            record.rental = a.rental;
            record.trend = a.trend;
            ListingOutcome::Complete(record)
        }
        Err(error) => {
            record.error = Some(error.to_string());
            ListingOutcome::Degraded { record, error }
        }
    }
}
