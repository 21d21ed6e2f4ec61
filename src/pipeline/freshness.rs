// src/pipeline/freshness.rs

use crate::domain::normalize_address;
use crate::pipeline::PersistenceError;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

pub const DEFAULT_FRESHNESS_DAYS: i64 = 30;

/// Address -> last analysis time, kept across runs.
/// Keys are normalized addresses (see [`normalize_address`]).
pub trait HistoryStore {
    fn last_analyzed(&self, address_key: &str) -> Result<Option<DateTime<Utc>>, PersistenceError>;

    fn record(&mut self, address_key: &str, at: DateTime<Utc>) -> Result<(), PersistenceError>;
}

/// In-process history, for tests and one-off runs that do not persist.
#[derive(Debug, Default, Clone)]
pub struct MemoryHistory {
    entries: HashMap<String, DateTime<Utc>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    fn last_analyzed(&self, address_key: &str) -> Result<Option<DateTime<Utc>>, PersistenceError> {
        Ok(self.entries.get(&normalize_address(address_key)).copied())
    }

    fn record(&mut self, address_key: &str, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        let slot = self
            .entries
            .entry(normalize_address(address_key))
            .or_insert(at);
        if at > *slot {
            *slot = at;
        }
        Ok(())
    }
}

/// Skips addresses analyzed within the freshness window.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessGate {
    window: Duration,
}

impl Default for FreshnessGate {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_DAYS)
    }
}

impl FreshnessGate {
    pub fn new(window_days: i64) -> Self {
        Self {
            window: Duration::days(window_days),
        }
    }

    /// `false` only if the address has a recorded analysis younger than the
    /// window. A history lookup error lets the listing through.
    pub fn should_process(
        &self,
        address: &str,
        history: &dyn HistoryStore,
        now: DateTime<Utc>,
    ) -> bool {
        let key = normalize_address(address);

        match history.last_analyzed(&key) {
            Ok(Some(last)) if now - last < self.window => {
                info!(address = %key, last_analyzed = %last, "recently analyzed, skipping");
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(address = %key, error = %e, "history lookup failed, processing anyway");
                true
            }
        }
    }
}
