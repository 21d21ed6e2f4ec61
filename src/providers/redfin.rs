// src/providers/redfin.rs

use crate::domain::{RawListing, SourceTag};
use crate::enrich::DescriptionProvider;
use crate::providers::http::{endpoint, HttpFetcher};
use crate::providers::ProviderError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use serde_json::Value;
use tracing::debug;

const BASE_URL: &str = "https://www.redfin.com";
const JSON_PREFIX: &str = "{}&&";

const DESCRIPTION_FIELDS: [&str; 4] = ["description", "remarks", "publicRemarks", "listingRemarks"];

/// Fallback description source over the public site endpoints.
/// Needs no credential and is frequently rate limited.
pub struct RedfinClient {
    http: HttpFetcher,
    base_url: String,
}

impl RedfinClient {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.redfin.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.redfin.com"));
        headers
    }

    fn get_prefixed_json(&self, url: &url::Url) -> Result<Value, ProviderError> {
        let text = self.http.get_text(url, &Self::headers())?;
        Ok(serde_json::from_str(strip_json_prefix(&text))?)
    }
}

impl DescriptionProvider for RedfinClient {
    fn tag(&self) -> SourceTag {
        SourceTag::Redfin
    }

    fn describe(&self, listing: &RawListing) -> Result<Option<String>, ProviderError> {
        let query = listing.address.full();

        let lookup = endpoint(
            &self.base_url,
            "/stingray/do/location-autocomplete",
            &[("location", query.as_str()), ("v", "2")],
        )?;
        let found = self.get_prefixed_json(&lookup)?;
        let property_id = find_property_id(&found).ok_or_else(|| ProviderError::NoMatch(query.clone()))?;
        debug!(%property_id, address = %query, "matched property");

        let details = endpoint(
            &self.base_url,
            "/stingray/api/home/details/aboveTheFold",
            &[("propertyId", property_id.as_str()), ("accessLevel", "1")],
        )?;
        let body = self.get_prefixed_json(&details)?;

        Ok(extract_description(&body))
    }
}

/// Responses are guarded with a `{}&&` prefix that must go before parsing.
pub fn strip_json_prefix(text: &str) -> &str {
    text.strip_prefix(JSON_PREFIX).unwrap_or(text)
}

/// Id of the first autocomplete row typed `address`.
pub fn find_property_id(body: &Value) -> Option<String> {
    body["payload"]["sections"]
        .as_array()?
        .iter()
        .filter_map(|section| section["rows"].as_array())
        .flatten()
        .find(|row| row["type"].as_str() == Some("address"))
        .and_then(|row| match &row["id"] {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

pub fn extract_description(body: &Value) -> Option<String> {
    let payload = &body["payload"];
    [payload, &payload["propertyDetails"], &payload["listingInfo"]]
        .into_iter()
        .flat_map(|scope| DESCRIPTION_FIELDS.iter().map(move |f| &scope[*f]))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_guard_prefix() {
        assert_eq!(strip_json_prefix("{}&&{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_json_prefix("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn first_address_row_is_used() {
        let raw = r#"{}&&{"payload":{"sections":[
            {"rows":[{"type":"city","id":"c1"}]},
            {"rows":[{"type":"address","id":"1234567"},{"type":"address","id":"999"}]}
        ]}}"#;
        let body: Value = serde_json::from_str(strip_json_prefix(raw)).unwrap();
        assert_eq!(find_property_id(&body).as_deref(), Some("1234567"));
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let body = json!({"payload": {"sections": [{"rows": [{"type": "address", "id": 42}]}]}});
        assert_eq!(find_property_id(&body).as_deref(), Some("42"));
    }

    #[test]
    fn no_address_rows() {
        let body = json!({"payload": {"sections": [{"rows": [{"type": "school", "id": 1}]}]}});
        assert_eq!(find_property_id(&body), None);
        assert_eq!(find_property_id(&json!({"errorMessage": "x"})), None);
    }

    #[test]
    fn description_scopes_in_order() {
        let body = json!({"payload": {
            "propertyDetails": {"listingRemarks": "Great bones, needs updating."},
            "listingInfo": {"description": "Later scope"}
        }});
        assert_eq!(
            extract_description(&body).as_deref(),
            Some("Great bones, needs updating.")
        );
        assert_eq!(extract_description(&json!({"payload": {}})), None);
    }
}
