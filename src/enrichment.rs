//! Per-symbol enrichment: profile lookup, secondary eligibility gate, and
//! assembly of one row per growth period with its closing price.

use chrono::{Duration, NaiveDate};
use std::fmt;
use tracing::debug;

use crate::api::MarketDataProvider;
use crate::error::{Result, ScreenerError};
use crate::models::{EligibilityConfig, InstrumentProfile, ReportingPeriod, ScreeningRow};

/// IPOs younger than this many days set `ipo_date_lt_10_years`
pub const RECENT_IPO_DAYS: i64 = 3650;

/// Minimum listing age, in days, to pass the eligibility gate
pub const MIN_LISTING_DAYS: i64 = 365;

/// Why an instrument was turned away by the eligibility gate
#[derive(Debug, Clone, PartialEq)]
pub enum GateRejection {
    MissingIpoDate,
    LowVolume { avg_volume: i64, threshold: i64 },
    RecentlyListed { ipo_date: NaiveDate },
    ExcludedCountry(String),
    Inactive,
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateRejection::MissingIpoDate => write!(f, "no IPO date"),
            GateRejection::LowVolume { avg_volume, threshold } => {
                write!(f, "average volume {} not above {}", avg_volume, threshold)
            }
            GateRejection::RecentlyListed { ipo_date } => write!(f, "listed too recently ({})", ipo_date),
            GateRejection::ExcludedCountry(country) => write!(f, "country {} is excluded", country),
            GateRejection::Inactive => write!(f, "not actively trading"),
        }
    }
}

/// Result of enriching one symbol
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolOutcome {
    Rows(Vec<ScreeningRow>),
    Skipped(GateRejection),
}

/// Fetch parameters for the fundamentals step
#[derive(Debug, Clone, Copy)]
pub struct GrowthRequest {
    pub period: ReportingPeriod,
    pub limit: usize,
}

impl Default for GrowthRequest {
    fn default() -> Self {
        Self {
            period: ReportingPeriod::Annual,
            limit: 3,
        }
    }
}

/// True when the IPO happened strictly fewer than 3650 days before `run_date`
pub fn listed_within_ten_years(ipo_date: Option<NaiveDate>, run_date: NaiveDate) -> bool {
    match ipo_date {
        Some(ipo) => (run_date - ipo).num_days() < RECENT_IPO_DAYS,
        None => false,
    }
}

/// Secondary eligibility gate; checks run in a fixed order and the first failure is reported
pub fn check_eligibility(
    profile: &InstrumentProfile,
    config: &EligibilityConfig,
    run_date: NaiveDate,
) -> std::result::Result<(), GateRejection> {
    let ipo_date = profile.ipo_date.ok_or(GateRejection::MissingIpoDate)?;

    if profile.avg_volume <= config.min_avg_volume {
        return Err(GateRejection::LowVolume {
            avg_volume: profile.avg_volume,
            threshold: config.min_avg_volume,
        });
    }

    if ipo_date >= run_date - Duration::days(MIN_LISTING_DAYS) {
        return Err(GateRejection::RecentlyListed { ipo_date });
    }

    if let Some(country) = &profile.country {
        if config.excluded_countries.iter().any(|excluded| excluded == country) {
            return Err(GateRejection::ExcludedCountry(country.clone()));
        }
    }

    if !profile.is_actively_trading {
        return Err(GateRejection::Inactive);
    }

    Ok(())
}

/// Enrich one symbol into its screening rows.
///
/// Any fetch or decode error is returned as-is; the caller decides how to
/// isolate it. No partial rows are returned on error.
pub async fn enrich_symbol<P>(
    provider: &P,
    symbol: &str,
    eligibility: &EligibilityConfig,
    growth: GrowthRequest,
    run_date: NaiveDate,
) -> Result<SymbolOutcome>
where
    P: MarketDataProvider + ?Sized,
{
    let profile = provider.get_profile(symbol).await?;
    let ipo_date_lt_10_years = listed_within_ten_years(profile.ipo_date, run_date);

    if let Err(rejection) = check_eligibility(&profile, eligibility, run_date) {
        debug!("Skipping {}: {}", symbol, rejection);
        return Ok(SymbolOutcome::Skipped(rejection));
    }

    let periods = provider
        .get_growth_history(symbol, growth.period, growth.limit)
        .await?;

    let mut rows = Vec::with_capacity(periods.len());
    for period in &periods {
        let prices = provider.get_price_history_ending(symbol, period.date).await?;
        let price = prices.first().ok_or_else(|| ScreenerError::EmptyResponse {
            symbol: symbol.to_string(),
            what: "price history",
        })?;
        rows.push(ScreeningRow::assemble(&profile, ipo_date_lt_10_years, period, price));
    }

    debug!("Assembled {} rows for {}", rows.len(), symbol);
    Ok(SymbolOutcome::Rows(rows))
}
