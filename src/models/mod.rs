use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScreenerError};

/// Instrument type as reported by the tradable-instruments list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentType {
    Stock,
    Etf,
    Fund,
    Other,
}

impl InstrumentType {
    pub fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "stock" => InstrumentType::Stock,
            "etf" => InstrumentType::Etf,
            "fund" => InstrumentType::Fund,
            _ => InstrumentType::Other,
        }
    }
}

/// One entry of the instrument universe
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSummary {
    pub symbol: String,
    pub name: Option<String>,
    pub exchange: Option<String>,
    pub instrument_type: InstrumentType,
    pub price: f64,
}

/// Raw tradable-list record; every field may be absent
#[derive(Debug, Clone, Deserialize)]
pub struct TradableRecord {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "exchangeShortName")]
    pub exchange_short_name: Option<String>,
    #[serde(rename = "type")]
    pub instrument_type: Option<String>,
}

impl TryFrom<TradableRecord> for InstrumentSummary {
    type Error = ScreenerError;

    fn try_from(record: TradableRecord) -> Result<Self> {
        let symbol = record
            .symbol
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ScreenerError::MissingField {
                symbol: "<unknown>".to_string(),
                field: "symbol",
            })?;
        let instrument_type = record
            .instrument_type
            .as_deref()
            .map(InstrumentType::from_label)
            .ok_or_else(|| ScreenerError::MissingField {
                symbol: symbol.clone(),
                field: "type",
            })?;
        let price = record.price.ok_or_else(|| ScreenerError::MissingField {
            symbol: symbol.clone(),
            field: "price",
        })?;

        Ok(InstrumentSummary {
            symbol,
            name: record.name,
            exchange: record.exchange_short_name,
            instrument_type,
            price,
        })
    }
}

/// Company profile fetched per surviving symbol
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstrumentProfile {
    pub symbol: String,
    #[serde(rename = "companyName", default)]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub isin: Option<String>,
    #[serde(rename = "ipoDate", default, deserialize_with = "optional_date")]
    pub ipo_date: Option<NaiveDate>,
    #[serde(rename = "isActivelyTrading")]
    pub is_actively_trading: bool,
    #[serde(rename = "volAvg", deserialize_with = "integer")]
    pub avg_volume: i64,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub country: Option<String>,
    #[serde(rename = "exchangeShortName", default)]
    pub exchange_short_name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

/// One fiscal period of year-over-year growth ratios
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GrowthPeriod {
    pub date: NaiveDate,
    #[serde(rename = "revenueGrowth")]
    pub revenue_growth: Option<f64>,
    #[serde(rename = "ebitgrowth")]
    pub ebit_growth: Option<f64>,
    #[serde(rename = "operatingIncomeGrowth")]
    pub operating_income_growth: Option<f64>,
    #[serde(rename = "netIncomeGrowth")]
    pub net_income_growth: Option<f64>,
    #[serde(rename = "epsgrowth")]
    pub eps_growth: Option<f64>,
    #[serde(rename = "inventoryGrowth")]
    pub inventory_growth: Option<f64>,
    #[serde(rename = "rdexpenseGrowth")]
    pub rd_expense_growth: Option<f64>,
    #[serde(rename = "debtGrowth")]
    pub debt_growth: Option<f64>,
    #[serde(rename = "sgaexpensesGrowth")]
    pub sga_expenses_growth: Option<f64>,
}

/// Daily price observation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    #[serde(rename = "adjClose")]
    pub adj_close: f64,
    #[serde(deserialize_with = "integer")]
    pub volume: i64,
}

/// Output unit: one row per (instrument, growth period)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreeningRow {
    pub date: NaiveDate,
    pub isin: Option<String>,
    pub symbol: String,
    pub company_name: Option<String>,
    pub ipo_date: Option<NaiveDate>,
    pub ipo_date_lt_10_years: bool,
    pub is_actively_trading: bool,
    pub avg_volume: i64,
    pub country: Option<String>,
    pub exchange_short_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub revenue_growth: Option<f64>,
    pub ebit_growth: Option<f64>,
    pub operating_income_growth: Option<f64>,
    pub net_income_growth: Option<f64>,
    pub eps_growth: Option<f64>,
    pub inventory_growth: Option<f64>,
    pub rd_expense_growth: Option<f64>,
    pub debt_growth: Option<f64>,
    pub sga_expenses_growth: Option<f64>,
    pub last_adjusted_close: f64,
    pub last_volume: i64,
    pub y_return: Option<f64>,
}

impl ScreeningRow {
    /// Assemble a row with the label still pending
    pub fn assemble(
        profile: &InstrumentProfile,
        ipo_date_lt_10_years: bool,
        period: &GrowthPeriod,
        price: &PricePoint,
    ) -> Self {
        ScreeningRow {
            date: period.date,
            isin: profile.isin.clone(),
            symbol: profile.symbol.clone(),
            company_name: profile.company_name.clone(),
            ipo_date: profile.ipo_date,
            ipo_date_lt_10_years,
            is_actively_trading: profile.is_actively_trading,
            avg_volume: profile.avg_volume,
            country: profile.country.clone(),
            exchange_short_name: profile.exchange_short_name.clone(),
            sector: profile.sector.clone(),
            industry: profile.industry.clone(),
            revenue_growth: period.revenue_growth,
            ebit_growth: period.ebit_growth,
            operating_income_growth: period.operating_income_growth,
            net_income_growth: period.net_income_growth,
            eps_growth: period.eps_growth,
            inventory_growth: period.inventory_growth,
            rd_expense_growth: period.rd_expense_growth,
            debt_growth: period.debt_growth,
            sga_expenses_growth: period.sga_expenses_growth,
            last_adjusted_close: price.adj_close,
            last_volume: price.volume,
            y_return: None,
        }
    }
}

/// Fundamentals reporting cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportingPeriod {
    #[default]
    Annual,
    Quarter,
}

impl ReportingPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportingPeriod::Annual => "annual",
            ReportingPeriod::Quarter => "quarter",
        }
    }
}

impl FromStr for ReportingPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "annual" => Ok(ReportingPeriod::Annual),
            "quarter" => Ok(ReportingPeriod::Quarter),
            other => Err(format!("unknown reporting period `{}` (expected annual or quarter)", other)),
        }
    }
}

/// Which rows a forward return looks ahead into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelScope {
    /// Next period of the same symbol
    #[default]
    PerInstrument,
    /// Next row of the globally date-sorted result set, whatever its symbol
    Global,
}

impl fmt::Display for LabelScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelScope::PerInstrument => write!(f, "per-instrument"),
            LabelScope::Global => write!(f, "global"),
        }
    }
}

impl FromStr for LabelScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per-instrument" | "per_instrument" | "instrument" => Ok(LabelScope::PerInstrument),
            "global" => Ok(LabelScope::Global),
            other => Err(format!("unknown label scope `{}` (expected per-instrument or global)", other)),
        }
    }
}

/// Thresholds for the first-stage filter chain
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    pub exchange_suffixes: Vec<String>,
    pub min_price: f64,
    pub max_price: f64,
    pub keep_etf: bool,
    /// Carried through configuration; no predicate reads it.
    pub keep_fund: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exchange_suffixes: vec![".PA".into(), ".BR".into(), ".AS".into(), ".LS".into()],
            min_price: 14.0,
            max_price: 420.0,
            keep_etf: false,
            keep_fund: false,
        }
    }
}

/// Thresholds for the secondary eligibility gate
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityConfig {
    pub min_avg_volume: i64,
    pub excluded_countries: Vec<String>,
}

impl Default for EligibilityConfig {
    fn default() -> Self {
        Self {
            min_avg_volume: 30_000,
            excluded_countries: vec!["US".into()],
        }
    }
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub fmp_api_key: String,
    pub fmp_base_url: String,
    pub database_path: String,
    pub filters: FilterConfig,
    pub eligibility: EligibilityConfig,
    pub growth_period: ReportingPeriod,
    pub growth_period_limit: usize,
    pub fetch_concurrency: usize,
    pub label_scope: LabelScope,
}

pub const DEFAULT_FMP_BASE_URL: &str = "https://financialmodelingprep.com/";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults_filter = FilterConfig::default();
        let defaults_gate = EligibilityConfig::default();

        let fmp_api_key = lookup("FMP_API_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ScreenerError::Config("FMP_API_KEY environment variable required".into()))?;

        let filters = FilterConfig {
            exchange_suffixes: lookup("FILTER_EXCHANGE_LIST")
                .map(|v| split_list(&v))
                .unwrap_or(defaults_filter.exchange_suffixes),
            min_price: parse_or(&lookup, "FILTER_MIN_PRICE", defaults_filter.min_price)?,
            max_price: parse_or(&lookup, "FILTER_MAX_PRICE", defaults_filter.max_price)?,
            keep_etf: parse_or(&lookup, "FILTER_KEEP_ETF", defaults_filter.keep_etf)?,
            keep_fund: parse_or(&lookup, "FILTER_KEEP_FUND", defaults_filter.keep_fund)?,
        };
        if filters.min_price > filters.max_price {
            return Err(ScreenerError::Config(format!(
                "FILTER_MIN_PRICE ({}) is greater than FILTER_MAX_PRICE ({})",
                filters.min_price, filters.max_price
            )));
        }

        let eligibility = EligibilityConfig {
            min_avg_volume: parse_or(&lookup, "FILTER_AVG_VOLUME", defaults_gate.min_avg_volume)?,
            excluded_countries: lookup("FILTER_COUNTRY_EXCLUSION")
                .map(|v| split_list(&v))
                .unwrap_or(defaults_gate.excluded_countries),
        };

        let fetch_concurrency: usize = parse_or(&lookup, "FETCH_CONCURRENCY", 1)?;

        Ok(Config {
            fmp_api_key,
            fmp_base_url: lookup("FMP_BASE_URL").unwrap_or_else(|| DEFAULT_FMP_BASE_URL.to_string()),
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "screener.db".to_string()),
            filters,
            eligibility,
            growth_period: parse_or(&lookup, "GROWTH_PERIOD", ReportingPeriod::Annual)?,
            growth_period_limit: parse_or(&lookup, "GROWTH_PERIOD_LIMIT", 3)?,
            fetch_concurrency: fetch_concurrency.max(1),
            label_scope: parse_or(&lookup, "LABEL_SCOPE", LabelScope::PerInstrument)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| ScreenerError::Config(format!("invalid value for {}: {}", key, e))),
        _ => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

fn optional_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_as_none(deserializer)? {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

// Volumes occasionally arrive as floats (e.g. 1234567.0)
fn integer<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value.round() as i64)
    } else {
        Err(serde::de::Error::custom("volume is not a finite number"))
    }
}
