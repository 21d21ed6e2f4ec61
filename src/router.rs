use crate::config::AppConfig;
use crate::db::{recent_records, Database};
use crate::domain::{AnalysisRecord, SearchCriteria};
use crate::errors::ServerError;
use crate::pipeline::{BatchReport, CancelFlag, SkippedListing};
use crate::responses::{html_response, json_error_response, json_response, xlsx_response, ResultResp};
use crate::search::{SearchOutcome, SearchService};
use crate::spreadsheets::export_records_xlsx;
use crate::templates;
use astra::Request;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

const MAX_BODY_BYTES: u64 = 64 * 1024;
const EXPORT_LIMIT: usize = 1_000;

pub struct AppState {
    pub db: Database,
    pub service: SearchService,
    pub config: AppConfig,
}

pub fn handle(req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    match (method.as_str(), path.as_str()) {
        ("GET", "/") => html_response(templates::pages::home_page(
            state.service.is_search_configured(),
        )),
        ("POST", "/search") => {
            let form = parse_form(&read_body(req)?);
            let (criteria, save) = criteria_from_form(&form)?;
            let outcome = state
                .service
                .run(&state.db, &criteria, save, &CancelFlag::new())?;
            html_response(templates::pages::results_page(&outcome))
        }
        ("POST", "/api/search") => api_search(req, state).or_else(|e| Ok(json_error_response(e))),
        ("GET", "/export.xlsx") => {
            let records = recent_records(&state.db, EXPORT_LIMIT)?;
            let buffer = export_records_xlsx(&records)?;
            xlsx_response(buffer, &format!("deals_{}.xlsx", Utc::now().format("%Y%m%d")))
        }
        ("GET", "/health") => json_response(&health(state)),
        _ => Err(ServerError::NotFound),
    }
}

#[derive(Debug, Deserialize)]
struct ApiSearchRequest {
    #[serde(flatten)]
    criteria: SearchCriteria,
    #[serde(default)]
    save_to_store: bool,
}

#[derive(Serialize)]
struct ApiSearchResponse<'a> {
    search_location: &'a str,
    records: Vec<&'a AnalysisRecord>,
    skipped: &'a [SkippedListing],
    cancelled: bool,
    report: Option<&'a BatchReport>,
}

impl<'a> From<&'a SearchOutcome> for ApiSearchResponse<'a> {
    fn from(o: &'a SearchOutcome) -> Self {
        Self {
            search_location: &o.search_location,
            records: o.output.records().collect(),
            skipped: &o.output.skipped,
            cancelled: o.output.cancelled,
            report: o.report.as_ref(),
        }
    }
}

fn api_search(req: Request, state: &AppState) -> ResultResp {
    let request: ApiSearchRequest = serde_json::from_str(&read_body(req)?)?;
    validate_criteria(&request.criteria)?;

    let outcome = state.service.run(
        &state.db,
        &request.criteria,
        request.save_to_store,
        &CancelFlag::new(),
    )?;
    json_response(&ApiSearchResponse::from(&outcome))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
    zillow_api_configured: bool,
    realtor_api_configured: bool,
    store_connected: bool,
}

fn health(state: &AppState) -> Health {
    let store_connected = state.db.ping();
    Health {
        status: if store_connected { "ok" } else { "degraded" },
        timestamp: Utc::now().to_rfc3339(),
        zillow_api_configured: state.service.is_search_configured(),
        realtor_api_configured: state.config.realtor_api_key.is_some(),
        store_connected,
    }
}

fn read_body(req: Request) -> Result<String, ServerError> {
    let mut body = req.into_body();
    let mut buf = String::new();
    body.reader()
        .take(MAX_BODY_BYTES)
        .read_to_string(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("unreadable body: {e}")))?;
    Ok(buf)
}

fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

fn optional<T: FromStr>(form: &HashMap<String, String>, key: &str) -> Result<Option<T>, ServerError> {
    match form.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ServerError::BadRequest(format!("{key} must be a whole number"))),
    }
}

fn criteria_from_form(form: &HashMap<String, String>) -> Result<(SearchCriteria, bool), ServerError> {
    let location = form.get("location").map(|l| l.trim()).unwrap_or_default();

    let mut criteria = SearchCriteria::new(location);
    criteria.min_price = optional(form, "min_price")?;
    criteria.max_price = optional(form, "max_price")?;
    criteria.beds_min = optional(form, "beds_min")?;
    criteria.baths_min = optional(form, "baths_min")?;
    if let Some(n) = optional(form, "screen_count")? {
        criteria.screen_count = n;
    }
    if let Some(n) = optional(form, "analyze_count")? {
        criteria.analyze_count = n;
    }
    criteria.include_trends = form.contains_key("include_trends");

    validate_criteria(&criteria)?;
    Ok((criteria, form.contains_key("save")))
}

fn validate_criteria(criteria: &SearchCriteria) -> Result<(), ServerError> {
    if criteria.location.trim().is_empty() {
        return Err(ServerError::BadRequest("location is required".into()));
    }
    if criteria.screen_count == 0 {
        return Err(ServerError::BadRequest("screen_count must be at least 1".into()));
    }
    if let (Some(min), Some(max)) = (criteria.min_price, criteria.max_price) {
        if min > max {
            return Err(ServerError::BadRequest("min_price is above max_price".into()));
        }
    }
    Ok(())
}
