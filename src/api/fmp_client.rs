use chrono::NaiveDate;
use reqwest::{Client, header::{HeaderMap, HeaderValue}};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Result, ScreenerError};
use crate::models::{
    Config, GrowthPeriod, InstrumentProfile, InstrumentSummary, PricePoint, ReportingPeriod,
    TradableRecord,
};
use super::MarketDataProvider;

/// Envelope returned by the full price history endpoint
#[derive(Debug, Deserialize)]
struct HistoricalPriceResponse {
    #[serde(default)]
    historical: Vec<PricePoint>,
}

/// Financial Modeling Prep API client
pub struct FmpClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl FmpClient {
    /// Create a new client from application configuration
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(&config.fmp_api_key, &config.fmp_base_url)
    }

    /// Create a client against an explicit API root
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("equity-screener/0.1")
            .default_headers(headers)
            .build()?;

        // Url::join drops the last path segment unless the root ends with '/'
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.base_url.join(path)?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("apikey", &self.api_key);
        Ok(url)
    }

    /// Make a GET request and decode the JSON body
    async fn make_request<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("Making request to: {}", url.path());

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ScreenerError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        debug!("API response received: {} bytes", bytes.len());
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Convert raw universe records, dropping the malformed ones
pub fn parse_universe(records: Vec<TradableRecord>) -> Vec<InstrumentSummary> {
    let total = records.len();
    let instruments: Vec<InstrumentSummary> = records
        .into_iter()
        .filter_map(|record| match InstrumentSummary::try_from(record) {
            Ok(instrument) => Some(instrument),
            Err(e) => {
                warn!("Dropping malformed universe record: {}", e);
                None
            }
        })
        .collect();

    if instruments.len() < total {
        warn!("{} of {} universe records were malformed", total - instruments.len(), total);
    }
    instruments
}

#[async_trait::async_trait]
impl MarketDataProvider for FmpClient {
    async fn list_tradable_instruments(&self) -> Result<Vec<InstrumentSummary>> {
        let url = self.endpoint("api/v3/available-traded/list", &[])?;
        let records: Vec<TradableRecord> = self.make_request(url).await?;
        debug!("Retrieved {} tradable records", records.len());
        Ok(parse_universe(records))
    }

    async fn get_profile(&self, symbol: &str) -> Result<InstrumentProfile> {
        let url = self.endpoint(&format!("api/v3/profile/{}", symbol), &[])?;
        let profiles: Vec<InstrumentProfile> = self.make_request(url).await?;

        profiles
            .into_iter()
            .next()
            .ok_or_else(|| ScreenerError::EmptyResponse {
                symbol: symbol.to_string(),
                what: "profile",
            })
    }

    async fn get_growth_history(
        &self,
        symbol: &str,
        period: ReportingPeriod,
        limit: usize,
    ) -> Result<Vec<GrowthPeriod>> {
        let limit = limit.to_string();
        let url = self.endpoint(
            &format!("api/v3/financial-growth/{}", symbol),
            &[("period", period.as_str()), ("limit", limit.as_str())],
        )?;
        let periods: Vec<GrowthPeriod> = self.make_request(url).await?;
        debug!("Retrieved {} growth periods for {}", periods.len(), symbol);
        Ok(periods)
    }

    async fn get_price_history_ending(&self, symbol: &str, date: NaiveDate) -> Result<Vec<PricePoint>> {
        let to = date.format("%Y-%m-%d").to_string();
        let url = self.endpoint(
            &format!("api/v3/historical-price-full/{}", symbol),
            &[("to", to.as_str())],
        )?;
        let response: HistoricalPriceResponse = self.make_request(url).await?;
        debug!("Retrieved {} price points for {} up to {}", response.historical.len(), symbol, date);
        Ok(response.historical)
    }
}
