use crate::pipeline::{PipelineConfig, DEFAULT_FRESHNESS_DAYS};
use crate::providers::HttpConfig;
use crate::scoring::rental::MAX_LOAN_TERM_YEARS;
use crate::scoring::RentalAssumptions;
use anyhow::{ensure, Result};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub zillow_api_key: Option<String>,
    pub realtor_api_key: Option<String>,
    pub http: HttpConfig,
    pub pipeline: PipelineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("deal_finder.sqlite3"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            zillow_api_key: None,
            realtor_api_key: None,
            http: HttpConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = RentalAssumptions::default();
        let rental = RentalAssumptions {
            down_payment_pct: parsed("RENTAL_DOWN_PAYMENT_PCT", defaults.down_payment_pct)?,
            interest_rate: parsed("RENTAL_INTEREST_RATE", defaults.interest_rate)?,
            loan_term_years: parsed("RENTAL_LOAN_TERM_YEARS", defaults.loan_term_years)?,
            closing_costs_pct: parsed("RENTAL_CLOSING_COSTS_PCT", defaults.closing_costs_pct)?,
            property_tax_pct: parsed("RENTAL_PROPERTY_TAX_PCT", defaults.property_tax_pct)?,
            insurance_monthly: parsed("RENTAL_INSURANCE_MONTHLY", defaults.insurance_monthly)?,
            hoa_monthly: parsed("RENTAL_HOA_MONTHLY", defaults.hoa_monthly)?,
            maintenance_pct: parsed("RENTAL_MAINTENANCE_PCT", defaults.maintenance_pct)?,
            vacancy_rate_pct: parsed("RENTAL_VACANCY_PCT", defaults.vacancy_rate_pct)?,
            management_pct: parsed("RENTAL_MANAGEMENT_PCT", defaults.management_pct)?,
        };
        check_rental(&rental)?;

        Ok(Self {
            database_path: env::var("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("deal_finder.sqlite3")),
            bind_addr: parsed("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            zillow_api_key: secret("ZILLOW_API_KEY"),
            realtor_api_key: secret("REALTOR_API_KEY"),
            http: HttpConfig {
                timeout: Duration::from_secs(parsed("PROVIDER_TIMEOUT_SECS", 15u64)?),
                max_attempts: parsed("PROVIDER_MAX_ATTEMPTS", 2u32)?,
            },
            pipeline: PipelineConfig {
                workers: parsed("ENRICH_WORKERS", 1usize)?.max(1),
                freshness_days: parsed("FRESHNESS_DAYS", DEFAULT_FRESHNESS_DAYS)?,
                rental,
            },
        })
    }
}

/// Rejects assumptions the rental math cannot use.
fn check_rental(a: &RentalAssumptions) -> Result<()> {
    let pcts = [
        ("RENTAL_DOWN_PAYMENT_PCT", a.down_payment_pct),
        ("RENTAL_INTEREST_RATE", a.interest_rate),
        ("RENTAL_CLOSING_COSTS_PCT", a.closing_costs_pct),
        ("RENTAL_PROPERTY_TAX_PCT", a.property_tax_pct),
        ("RENTAL_INSURANCE_MONTHLY", a.insurance_monthly),
        ("RENTAL_HOA_MONTHLY", a.hoa_monthly),
        ("RENTAL_MAINTENANCE_PCT", a.maintenance_pct),
        ("RENTAL_VACANCY_PCT", a.vacancy_rate_pct),
        ("RENTAL_MANAGEMENT_PCT", a.management_pct),
    ];
    for (name, value) in pcts {
        ensure!(value.is_finite() && value >= 0.0, "{name} must be a non-negative number, got {value}");
    }
    ensure!(
        a.down_payment_pct <= 100.0,
        "RENTAL_DOWN_PAYMENT_PCT must be at most 100, got {}",
        a.down_payment_pct
    );
    ensure!(
        a.vacancy_rate_pct < 100.0,
        "RENTAL_VACANCY_PCT must be below 100, got {}",
        a.vacancy_rate_pct
    );
    ensure!(
        (1..=MAX_LOAN_TERM_YEARS).contains(&a.loan_term_years),
        "RENTAL_LOAN_TERM_YEARS must be between 1 and {MAX_LOAN_TERM_YEARS}, got {}",
        a.loan_term_years
    );
    Ok(())
}

fn secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} has an invalid value {raw:?}: {e}")),
        _ => Ok(default),
    }
}
