// src/tests/pipeline_tests.rs

use crate::domain::{AnalysisRecord, SourceTag};
use crate::enrich::{DescriptionProvider, DescriptionResolver, EmbeddedDescription};
use crate::pipeline::{
    CancelFlag, HistoryStore, ListingOutcome, MemoryHistory, MemorySink, PersistenceError,
    Pipeline, PipelineConfig, RecordSink, SkipReason,
};
use crate::providers::ProviderError;
use crate::scoring::{DealGrade, RehabTier};
use crate::tests::utils::{listing, offline_pipeline, sample_listings, FixedClock, FixedSource};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;

const LOCATION: &str = "Atlanta, GA";

fn run(pipeline: &Pipeline, history: &MemoryHistory) -> crate::pipeline::RunOutput {
    pipeline.run(&sample_listings(), history, LOCATION, &CancelFlag::new())
}

#[test]
fn records_keep_input_order_and_ranks() {
    for workers in [1, 3] {
        let out = run(&offline_pipeline(workers), &MemoryHistory::new());

        let streets: Vec<&str> = out
            .records()
            .map(|r| r.listing.address.street.as_str())
            .collect();
        assert_eq!(streets, ["1875 Avondale Circle", "42 Peachtree Pl", "7 Magnolia Dr"]);

        let ranks: Vec<usize> = out.records().map(|r| r.rank).collect();
        assert_eq!(ranks, [1, 2, 3]);
        assert!(!out.cancelled);
    }
}

#[test]
fn fixer_listing_is_scored_end_to_end() {
    let out = run(&offline_pipeline(1), &MemoryHistory::new());
    let r = out.outcomes[0].record();

    assert_eq!(r.description.source(), SourceTag::Zillow);
    assert!(r.keywords.is_fixer());
    assert_eq!(
        r.keywords.matched_phrases(),
        ["cash only", "investor special", "needs work"]
    );

    let s = r.deal.scenarios.as_ref().unwrap();
    assert_eq!(s.get(RehabTier::Light).mao, Decimal::from(158_500));
    assert_eq!(s.get(RehabTier::Light).profit, Decimal::from(-91_500));
    assert_eq!(s.get(RehabTier::Medium).mao, Decimal::from(136_000));
    assert_eq!(s.get(RehabTier::Heavy).mao, Decimal::from(106_000));
    assert_eq!(s.best, RehabTier::Light);
    assert_eq!(r.deal.score, Some(1));
    assert_eq!(r.deal.grade, DealGrade::Poor);
    assert!(r.rental.is_some());
}

#[test]
fn profitable_fixer_gets_bonus_point() {
    let out = run(&offline_pipeline(1), &MemoryHistory::new());
    let r = out.outcomes[1].record();

    assert_eq!(r.deal.scenarios.as_ref().unwrap().best_profit, Decimal::from(34_000));
    assert_eq!(r.deal.score, Some(8));
    assert_eq!(r.deal.grade, DealGrade::Good);
    assert_eq!(r.deal.recommendation, "Buy - Verify Light Rehab Scope");
}

#[test]
fn missing_arv_still_gets_keywords_and_rental() {
    let mut l = listing("5 Oak St", 120_000, 1_000, None);
    l.description = Some("Handyman special".into());
    l.rent_estimate = Some(Decimal::from(1_300));

    let out = offline_pipeline(1).run(&[l], &MemoryHistory::new(), LOCATION, &CancelFlag::new());
    let r = out.outcomes[0].record();

    assert!(matches!(out.outcomes[0], ListingOutcome::Complete(_)));
    assert!(r.keywords.is_fixer());
    assert!(r.deal.scenarios.is_none());
    assert_eq!(r.deal.score, None);
    assert_eq!(r.deal.grade, DealGrade::InsufficientData);
    assert!(r.rental.is_some());
    assert!(r.error.is_none());
}

#[test]
fn duplicate_address_in_batch_is_analyzed_once() {
    let mut batch = sample_listings();
    let mut dup = batch[0].clone();
    dup.address.street = "1875  AVONDALE circle".into();
    batch.insert(2, dup);

    let out = offline_pipeline(1).run(&batch, &MemoryHistory::new(), LOCATION, &CancelFlag::new());

    assert_eq!(out.outcomes.len(), 3);
    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].input_index, 2);
    assert_eq!(out.skipped[0].reason, SkipReason::DuplicateInBatch);

    let indices: Vec<usize> = out.records().map(|r| r.input_index).collect();
    assert_eq!(indices, [0, 1, 3]);
    let ranks: Vec<usize> = out.records().map(|r| r.rank).collect();
    assert_eq!(ranks, [1, 2, 3]);
}

#[test]
fn recently_analyzed_addresses_are_skipped() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let listings = sample_listings();

    let mut history = MemoryHistory::new();
    history
        .record(&listings[0].address.key(), now - Duration::days(29))
        .unwrap();
    history
        .record(&listings[1].address.key(), now - Duration::days(31))
        .unwrap();

    let pipeline = offline_pipeline(1).with_clock(FixedClock(now));
    let out = pipeline.run(&listings, &history, LOCATION, &CancelFlag::new());

    assert_eq!(out.skipped.len(), 1);
    assert_eq!(out.skipped[0].reason, SkipReason::RecentlyAnalyzed);
    assert_eq!(out.skipped[0].input_index, 0);

    let streets: Vec<&str> = out.records().map(|r| r.listing.address.street.as_str()).collect();
    assert_eq!(streets, ["42 Peachtree Pl", "7 Magnolia Dr"]);
    assert_eq!(out.outcomes[0].record().rank, 1);
    assert!(out.records().all(|r| r.analyzed_at == now));
}

#[test]
fn invalid_listing_is_emitted_degraded() {
    let mut batch = sample_listings();
    batch[1].address.street = "   ".into();

    let out = offline_pipeline(1).run(&batch, &MemoryHistory::new(), LOCATION, &CancelFlag::new());

    assert_eq!(out.outcomes.len(), 3);
    assert_eq!(out.degraded_count(), 1);

    let ListingOutcome::Degraded { record, error } = &out.outcomes[1] else {
        panic!("second listing should be degraded");
    };
    assert!(error.to_string().contains("missing street address"));
    assert_eq!(record.error.as_deref(), Some(error.to_string().as_str()));
    assert_eq!(record.rank, 2);
    assert_eq!(record.deal.grade, DealGrade::InsufficientData);
    assert!(!record.keywords.is_fixer());
    assert_eq!(record.description.source(), SourceTag::None);
}

#[test]
fn fallback_sources_fill_missing_descriptions() {
    let resolver = DescriptionResolver::new(vec![
        Box::new(EmbeddedDescription),
        Box::new(FixedSource {
            tag: SourceTag::Realtor,
            text: None,
        }),
        Box::new(FixedSource {
            tag: SourceTag::Redfin,
            text: Some("Bank owned <b>foreclosure</b>"),
        }),
    ]);
    let pipeline = Pipeline::new(resolver, PipelineConfig::default());

    let out = pipeline.run(&sample_listings(), &MemoryHistory::new(), LOCATION, &CancelFlag::new());

    let plain = out.outcomes[2].record();
    assert_eq!(plain.description.source(), SourceTag::Redfin);
    assert_eq!(plain.description.text(), "Bank owned foreclosure");
    assert_eq!(plain.keywords.matched_phrases(), ["foreclosure", "bank owned"]);

    assert_eq!(out.outcomes[0].record().description.source(), SourceTag::Zillow);
}

/// Raises the cancel flag the first time it is consulted.
struct CancelOnFirstCall(CancelFlag);

impl DescriptionProvider for CancelOnFirstCall {
    fn tag(&self) -> SourceTag {
        SourceTag::Realtor
    }

    fn describe(&self, _: &crate::domain::RawListing) -> Result<Option<String>, ProviderError> {
        self.0.cancel();
        Ok(None)
    }
}

#[test]
fn cancellation_keeps_completed_listings_only() {
    let cancel = CancelFlag::new();
    let pipeline = Pipeline::new(
        DescriptionResolver::new(vec![Box::new(CancelOnFirstCall(cancel.clone()))]),
        PipelineConfig::default(),
    );

    let out = pipeline.run(&sample_listings(), &MemoryHistory::new(), LOCATION, &cancel);

    assert!(out.cancelled);
    assert_eq!(out.outcomes.len(), 1);
    assert_eq!(out.outcomes[0].record().rank, 1);
    assert!(!out.outcomes[0].is_degraded());
}

/// Rejects one record id.
struct FlakySink {
    reject: String,
    inner: MemorySink,
}

impl RecordSink for FlakySink {
    fn append(&mut self, record: &AnalysisRecord) -> Result<(), PersistenceError> {
        if record.record_id == self.reject {
            return Err(PersistenceError::Write {
                record_id: record.record_id.clone(),
                message: "quota exceeded".into(),
            });
        }
        self.inner.append(record)
    }
}

#[test]
fn partial_write_failure_is_reported_per_record() {
    let pipeline = offline_pipeline(1);
    let mut batch = sample_listings();
    batch[2].address.street = String::new();
    let out = pipeline.run(&batch, &MemoryHistory::new(), LOCATION, &CancelFlag::new());

    let mut sink = FlakySink {
        reject: out.outcomes[0].record().record_id.clone(),
        inner: MemorySink::default(),
    };
    let mut history = MemoryHistory::new();
    let report = pipeline.persist(&out, &mut sink, &mut history);

    assert_eq!(report.persisted.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].record_id, out.outcomes[0].record().record_id);
    assert!(report.failed[0].error.contains("quota exceeded"));
    assert!(!report.is_complete());
    assert_eq!(sink.inner.records.len(), 2);

    // Only the written, fully analyzed listing becomes fresh.
    assert_eq!(history.len(), 1);
    let fresh = out.outcomes[1].record();
    assert_eq!(
        history.last_analyzed(&fresh.address_key).unwrap(),
        Some(fresh.analyzed_at)
    );
}

#[test]
fn second_run_skips_what_the_first_persisted() {
    let pipeline = offline_pipeline(2);
    let mut history = MemoryHistory::new();

    let first = pipeline.run(&sample_listings(), &history, LOCATION, &CancelFlag::new());
    let report = pipeline.persist(&first, &mut MemorySink::default(), &mut history);
    assert!(report.is_complete());

    let second = pipeline.run(&sample_listings(), &history, LOCATION, &CancelFlag::new());
    assert!(second.outcomes.is_empty());
    assert_eq!(second.skipped.len(), 3);
    assert!(second
        .skipped
        .iter()
        .all(|s| s.reason == SkipReason::RecentlyAnalyzed));
}
