// src/providers/zillow.rs

use crate::domain::{Address, RawListing, SearchCriteria, SourceTag, TrendPoint};
use crate::providers::http::{endpoint, rapidapi_headers, HttpFetcher};
use crate::providers::ProviderError;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{info, warn};

pub const ZILLOW_HOST: &str = "zillow-working-api.p.rapidapi.com";
const SORT_ORDER: &str = "Homes_for_you";

/// Bulk listing search. The pipeline only sees its output.
pub trait ListingSearch: Send + Sync {
    fn is_configured(&self) -> bool;

    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<RawListing>, ProviderError>;
}

pub struct ZillowClient {
    http: HttpFetcher,
    api_key: Option<String>,
    base_url: String,
}

impl ZillowClient {
    pub fn new(http: HttpFetcher, api_key: Option<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: format!("https://{ZILLOW_HOST}"),
        }
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("zillow"))?;
        rapidapi_headers(key, ZILLOW_HOST)
    }

    /// Zestimate history for one property, most recent first.
    pub fn price_history(&self, zpid: &str) -> Result<Vec<TrendPoint>, ProviderError> {
        let url = endpoint(
            &self.base_url,
            "/graph_charts",
            &[
                ("recent_first", "True"),
                ("which", "zestimate_history"),
                ("byzpid", zpid),
            ],
        )?;
        let body = self.http.get_json(&url, &self.headers()?)?;
        Ok(parse_trend_points(&body))
    }

    /// Full property record for one address.
    pub fn property_details(&self, address: &Address) -> Result<PropertyDetails, ProviderError> {
        let full = address.full();
        let url = endpoint(
            &self.base_url,
            "/pro/byaddress",
            &[("propertyaddress", full.as_str())],
        )?;
        let body = self.http.get_json(&url, &self.headers()?)?;
        Ok(parse_property_details(&body))
    }
}

impl ListingSearch for ZillowClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn search(&self, criteria: &SearchCriteria) -> Result<Vec<RawListing>, ProviderError> {
        let headers = self.headers()?;
        let prompt = criteria.to_prompt();
        let url = endpoint(
            &self.base_url,
            "/search/byaiprompt",
            &[
                ("ai_search_prompt", prompt.as_str()),
                ("page", "1"),
                ("sortOrder", SORT_ORDER),
            ],
        )?;

        info!(%prompt, "searching listings");
        let body = self.http.get_json(&url, &headers)?;
        let mut listings = parse_search_results(&body, criteria.screen_count)?;
        info!(count = listings.len(), "search returned listings");

        if criteria.analyze_count > 0 {
            let filled = fill_missing_details(&mut listings, criteria.analyze_count, |address| {
                self.property_details(address)
            });
            info!(filled, "merged property details");
        }

        if criteria.include_trends {
            for listing in listings.iter_mut() {
                let Some(zpid) = listing.provider_id.clone() else {
                    continue;
                };
                match self.price_history(&zpid) {
                    Ok(points) => listing.price_trend = points,
                    Err(e) => warn!(%zpid, error = %e, "price history unavailable"),
                }
            }
        }

        Ok(listings)
    }
}

/// Maps `searchResults[].property` into listings, keeping at most `limit`.
pub fn parse_search_results(body: &Value, limit: usize) -> Result<Vec<RawListing>, ProviderError> {
    let results = body
        .get("searchResults")
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::Malformed("searchResults missing".into()))?;

    Ok(results
        .iter()
        .take(limit)
        .map(|item| parse_property(item.get("property").unwrap_or(item)))
        .collect())
}

fn parse_property(p: &Value) -> RawListing {
    let addr = &p["address"];
    let address = Address {
        street: text(&addr["streetAddress"]).unwrap_or_default(),
        city: text(&addr["city"]).unwrap_or_default(),
        state: text(&addr["state"]).unwrap_or_default(),
        zip: text(&addr["zipcode"]).unwrap_or_default(),
    };

    let mut listing = RawListing::new(SourceTag::Zillow, address);
    listing.provider_id = text(&p["zpid"]);
    listing.list_price = money(p.get("price").map(|v| v.get("value").unwrap_or(v)));
    listing.beds = p["bedrooms"].as_u64().and_then(|b| u32::try_from(b).ok());
    listing.baths = p["bathrooms"].as_f64();
    listing.sqft = p["livingArea"]
        .as_f64()
        .filter(|s| *s >= 0.0)
        .map(|s| s.round() as u32);
    listing.arv = money(p.get("zestimate"));
    listing.rent_estimate = money(p.get("rentZestimate"));
    listing.description = text(&p["description"]);
    listing
}

/// Values a details lookup can supply for a search result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDetails {
    pub sqft: Option<u32>,
    pub arv: Option<Decimal>,
    pub rent_estimate: Option<Decimal>,
    pub description: Option<String>,
}

impl PropertyDetails {
    /// Fills only the fields `listing` lacks.
    pub fn merge_into(self, listing: &mut RawListing) {
        if listing.sqft.map_or(true, |s| s == 0) && self.sqft.is_some() {
            listing.sqft = self.sqft;
        }
        listing.arv = listing.arv.or(self.arv);
        listing.rent_estimate = listing.rent_estimate.or(self.rent_estimate);
        if listing.description.is_none() {
            listing.description = self.description;
        }
    }
}

fn needs_details(listing: &RawListing) -> bool {
    listing.arv.is_none()
        || listing.rent_estimate.is_none()
        || listing.description.is_none()
        || listing.sqft.map_or(true, |s| s == 0)
}

/// Looks up details for those of the first `limit` listings that are
/// missing a value, returning how many lookups succeeded. A failed lookup
/// leaves its listing untouched.
pub fn fill_missing_details<F>(listings: &mut [RawListing], limit: usize, mut lookup: F) -> usize
where
    F: FnMut(&Address) -> Result<PropertyDetails, ProviderError>,
{
    let mut filled = 0;
    for listing in listings.iter_mut().take(limit) {
        if !needs_details(listing) {
            continue;
        }
        match lookup(&listing.address) {
            Ok(details) => {
                details.merge_into(listing);
                filled += 1;
            }
            Err(e) => {
                warn!(address = %listing.address.full(), error = %e, "property details unavailable")
            }
        }
    }
    filled
}

/// Reads a `/pro/byaddress` body. The property sits under `data`,
/// `property`, or at the top level depending on the listing.
pub fn parse_property_details(body: &Value) -> PropertyDetails {
    let p = ["data", "property"]
        .iter()
        .find_map(|k| body.get(*k).filter(|v| v.is_object()))
        .unwrap_or(body);

    PropertyDetails {
        sqft: first(p, &["livingArea", "sqft", "squareFeet"])
            .and_then(Value::as_f64)
            .filter(|s| *s > 0.0)
            .map(|s| s.round() as u32),
        arv: money(first(p, &["zestimate", "estimate"])),
        rent_estimate: money(first(p, &["rentZestimate", "rent_zestimate"])),
        description: first(p, &["description"]).and_then(text),
    }
}

fn first<'a>(p: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| p.get(*k)).find(|v| !v.is_null())
}

/// The "This home" series of a value-history response.
pub fn parse_trend_points(body: &Value) -> Vec<TrendPoint> {
    body["DataPoints"]["homeValueChartData"]
        .as_array()
        .and_then(|series| {
            series
                .iter()
                .find(|s| s["name"].as_str() == Some("This home"))
        })
        .and_then(|s| s["points"].as_array())
        .map(|points| {
            points
                .iter()
                .filter_map(|p| {
                    Some(TrendPoint {
                        date_ms: p["x"].as_i64()?,
                        value: p["y"].as_f64()?,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn money(v: Option<&Value>) -> Option<Decimal> {
    match v? {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        },
        Value::String(s) => s.replace(['$', ','], "").trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "searchResults": [
                { "property": {
                    "zpid": 14341709,
                    "address": {
                        "streetAddress": "123 Main St",
                        "city": "Atlanta",
                        "state": "GA",
                        "zipcode": "30310"
                    },
                    "price": { "value": 95000 },
                    "bedrooms": 3,
                    "bathrooms": 1.5,
                    "livingArea": 1400,
                    "zestimate": 180000,
                    "rentZestimate": 1450,
                    "description": "Investor special. Needs work."
                }},
                { "property": {
                    "address": { "streetAddress": "9 Elm Ave", "city": "Atlanta", "state": "GA", "zipcode": "30311" },
                    "price": "$120,000"
                }},
                { "property": { "address": { "streetAddress": "1 Extra Rd" } } }
            ]
        })
    }

    #[test]
    fn maps_search_fields() {
        let listings = parse_search_results(&sample(), 20).unwrap();
        assert_eq!(listings.len(), 3);

        let first = &listings[0];
        assert_eq!(first.provider_id.as_deref(), Some("14341709"));
        assert_eq!(first.address.full(), "123 Main St, Atlanta, GA 30310");
        assert_eq!(first.list_price, Some(Decimal::from(95_000)));
        assert_eq!(first.beds, Some(3));
        assert_eq!(first.baths, Some(1.5));
        assert_eq!(first.sqft, Some(1_400));
        assert_eq!(first.arv, Some(Decimal::from(180_000)));
        assert_eq!(first.rent_estimate, Some(Decimal::from(1_450)));
        assert_eq!(first.description.as_deref(), Some("Investor special. Needs work."));
    }

    #[test]
    fn missing_fields_stay_absent() {
        let listings = parse_search_results(&sample(), 20).unwrap();
        let second = &listings[1];
        assert_eq!(second.list_price, Some(Decimal::from(120_000)));
        assert_eq!(second.arv, None);
        assert_eq!(second.sqft, None);
        assert_eq!(second.description, None);
    }

    #[test]
    fn respects_screen_count() {
        assert_eq!(parse_search_results(&sample(), 2).unwrap().len(), 2);
    }

    #[test]
    fn missing_results_is_malformed() {
        let err = parse_search_results(&json!({"message": "quota"}), 20).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn picks_this_home_series() {
        let body = json!({
            "DataPoints": { "homeValueChartData": [
                { "name": "Atlanta", "points": [{ "x": 1, "y": 5.0 }] },
                { "name": "This home", "points": [
                    { "x": 1_700_000_000_000i64, "y": 180000.0 },
                    { "x": 1_668_000_000_000i64, "y": 200000 }
                ]}
            ]}
        });
        let points = parse_trend_points(&body);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].value, 200_000.0);
        assert!(parse_trend_points(&json!({})).is_empty());
    }

    #[test]
    fn details_read_nested_and_alternate_fields() {
        let nested = json!({
            "data": {
                "livingArea": 1250,
                "zestimate": 210000,
                "rentZestimate": 1600,
                "description": "Estate sale, needs TLC"
            }
        });
        assert_eq!(
            parse_property_details(&nested),
            PropertyDetails {
                sqft: Some(1_250),
                arv: Some(Decimal::from(210_000)),
                rent_estimate: Some(Decimal::from(1_600)),
                description: Some("Estate sale, needs TLC".into()),
            }
        );

        let flat = json!({ "squareFeet": 980.4, "estimate": "$150,000", "rent_zestimate": null });
        let d = parse_property_details(&flat);
        assert_eq!(d.sqft, Some(980));
        assert_eq!(d.arv, Some(Decimal::from(150_000)));
        assert_eq!(d.rent_estimate, None);
        assert_eq!(d.description, None);
    }

    #[test]
    fn details_fill_gaps_without_overwriting() {
        let mut listings = parse_search_results(&sample(), 20).unwrap();
        let details = || PropertyDetails {
            sqft: Some(2_000),
            arv: Some(Decimal::from(150_000)),
            rent_estimate: Some(Decimal::from(1_100)),
            description: Some("Fixer upper".into()),
        };

        let mut looked_up = Vec::new();
        let filled = fill_missing_details(&mut listings, 2, |address| {
            looked_up.push(address.street.clone());
            Ok(details())
        });

        // The first result already has every value; the third is past the limit.
        assert_eq!(looked_up, ["9 Elm Ave"]);
        assert_eq!(filled, 1);
        assert_eq!(listings[0].arv, Some(Decimal::from(180_000)));
        assert_eq!(listings[0].sqft, Some(1_400));

        let second = &listings[1];
        assert_eq!(second.list_price, Some(Decimal::from(120_000)));
        assert_eq!(second.arv, Some(Decimal::from(150_000)));
        assert_eq!(second.rent_estimate, Some(Decimal::from(1_100)));
        assert_eq!(second.sqft, Some(2_000));
        assert_eq!(second.description.as_deref(), Some("Fixer upper"));

        assert_eq!(listings[2].arv, None);
    }

    #[test]
    fn failed_detail_lookup_leaves_listing_alone() {
        let mut listings = parse_search_results(&sample(), 20).unwrap();
        let before = listings.clone();

        let filled = fill_missing_details(&mut listings, 5, |_| {
            Err(ProviderError::Unavailable("timeout".into()))
        });

        assert_eq!(filled, 0);
        assert_eq!(listings, before);
        assert_eq!(fill_missing_details(&mut listings, 0, |_| Ok(PropertyDetails::default())), 0);
    }

    #[test]
    fn search_without_key_is_missing_credential() {
        let client = ZillowClient::new(HttpFetcher::new(&Default::default()).unwrap(), Some("  ".into()));
        assert!(!client.is_configured());
        let err = client.search(&SearchCriteria::new("Atlanta, GA")).unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential("zillow")));
    }
}
