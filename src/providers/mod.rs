pub mod http;
pub mod provider_error;
pub mod realtor;
pub mod redfin;
pub mod zillow;

pub use http::{HttpConfig, HttpFetcher};
pub use provider_error::ProviderError;
pub use realtor::RealtorClient;
pub use redfin::RedfinClient;
pub use zillow::{ListingSearch, ZillowClient};

use crate::enrich::{DescriptionProvider, DescriptionResolver, EmbeddedDescription};

/// Embedded text, then Realtor (keyed), then Redfin.
pub fn default_waterfall(http: &HttpFetcher, realtor_api_key: Option<String>) -> DescriptionResolver {
    let sources: Vec<Box<dyn DescriptionProvider>> = vec![
        Box::new(EmbeddedDescription),
        Box::new(RealtorClient::new(http.clone(), realtor_api_key)),
        Box::new(RedfinClient::new(http.clone())),
    ];
    DescriptionResolver::new(sources)
}
