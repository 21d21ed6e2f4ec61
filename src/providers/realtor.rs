// src/providers/realtor.rs

use crate::domain::{RawListing, SourceTag};
use crate::enrich::DescriptionProvider;
use crate::providers::http::{endpoint, rapidapi_headers, HttpFetcher};
use crate::providers::ProviderError;
use serde_json::Value;

pub const REALTOR_HOST: &str = "realtor.p.rapidapi.com";

const DESCRIPTION_FIELDS: [&str; 5] = [
    "description",
    "public_remarks",
    "remarks",
    "listing_description",
    "property_description",
];

/// Secondary description source. Only consulted when a key is supplied.
pub struct RealtorClient {
    http: HttpFetcher,
    api_key: Option<String>,
    base_url: String,
}

impl RealtorClient {
    pub fn new(http: HttpFetcher, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: format!("https://{REALTOR_HOST}"),
        }
    }
}

impl DescriptionProvider for RealtorClient {
    fn tag(&self) -> SourceTag {
        SourceTag::Realtor
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn describe(&self, listing: &RawListing) -> Result<Option<String>, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("realtor"))?;

        let query = listing.address.full();
        let url = endpoint(
            &self.base_url,
            "/properties/v3/detail",
            &[("property_id", query.as_str())],
        )?;
        let body = self.http.get_json(&url, &rapidapi_headers(key, REALTOR_HOST)?)?;

        Ok(extract_description(&body))
    }
}

/// First non-empty description field, checked at the top level, then under
/// `listing`, then under `data`.
pub fn extract_description(body: &Value) -> Option<String> {
    [body, &body["listing"], &body["data"]]
        .into_iter()
        .flat_map(|scope| DESCRIPTION_FIELDS.iter().map(move |f| &scope[*f]))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}
