use crate::config::AppConfig;
use crate::db::connection::{init_db, Database};
use crate::domain::{Address, RawListing, SearchCriteria, SourceTag};
use crate::enrich::{DescriptionProvider, DescriptionResolver, EmbeddedDescription};
use crate::pipeline::{Clock, Pipeline, PipelineConfig};
use crate::providers::{ListingSearch, ProviderError};
use crate::router::AppState;
use crate::search::SearchService;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh database file in the temp dir, initialised from the production schema
pub fn init_test_db() -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "deal_finder_test_{nanos}_{}.sqlite",
        DB_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));

    let db = Database::new(path);
    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));
    db
}

pub fn listing(street: &str, price: i64, sqft: u32, arv: Option<i64>) -> RawListing {
    let mut l = RawListing::new(
        SourceTag::Zillow,
        Address {
            street: street.into(),
            city: "Atlanta".into(),
            state: "GA".into(),
            zip: "30310".into(),
        },
    );
    l.list_price = Some(Decimal::from(price));
    l.sqft = Some(sqft);
    l.arv = arv.map(Decimal::from);
    l
}

/// Answers with fixed text for every listing.
pub struct FixedSource {
    pub tag: SourceTag,
    pub text: Option<&'static str>,
}

impl DescriptionProvider for FixedSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    fn describe(&self, _listing: &RawListing) -> Result<Option<String>, ProviderError> {
        Ok(self.text.map(str::to_string))
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Embedded descriptions only; no network.
pub fn offline_pipeline(workers: usize) -> Pipeline {
    Pipeline::new(
        DescriptionResolver::new(vec![Box::new(EmbeddedDescription)]),
        PipelineConfig {
            workers,
            ..PipelineConfig::default()
        },
    )
}

pub struct StaticSearch(pub Vec<RawListing>);

impl ListingSearch for StaticSearch {
    fn is_configured(&self) -> bool {
        true
    }

    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<RawListing>, ProviderError> {
        Ok(self.0.iter().take(criteria.screen_count).cloned().collect())
    }
}

pub struct UnavailableSearch;

impl ListingSearch for UnavailableSearch {
    fn is_configured(&self) -> bool {
        false
    }

    fn search(&self, _criteria: &SearchCriteria) -> Result<Vec<RawListing>, ProviderError> {
        Err(ProviderError::MissingCredential("zillow"))
    }
}

pub fn app_state(search: impl ListingSearch + 'static) -> AppState {
    let db = init_test_db();
    let config = AppConfig {
        database_path: db.path().to_path_buf(),
        ..AppConfig::default()
    };

    AppState {
        db,
        service: SearchService::new(Box::new(search), offline_pipeline(1)),
        config,
    }
}

pub fn sample_listings() -> Vec<RawListing> {
    let mut fixer = listing("1875 Avondale Circle", 250_000, 1_500, Some(280_000));
    fixer.description = Some("Cash only, investor special, needs work".into());
    fixer.rent_estimate = Some(Decimal::from(1_900));

    let mut flip = listing("42 Peachtree Pl", 90_000, 1_200, Some(220_000));
    flip.description = Some("Estate sale. Sold as is.".into());

    let plain = listing("7 Magnolia Dr", 150_000, 1_600, None);

    vec![fixer, flip, plain]
}
