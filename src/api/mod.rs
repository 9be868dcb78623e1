use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{GrowthPeriod, InstrumentProfile, InstrumentSummary, PricePoint, ReportingPeriod};

pub mod fmp_client;
pub use fmp_client::FmpClient;

/// Market data capabilities the screener needs from a provider
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Full universe of tradable instruments
    async fn list_tradable_instruments(&self) -> Result<Vec<InstrumentSummary>>;

    async fn get_profile(&self, symbol: &str) -> Result<InstrumentProfile>;

    /// Most recent `limit` growth periods, newest first
    async fn get_growth_history(
        &self,
        symbol: &str,
        period: ReportingPeriod,
        limit: usize,
    ) -> Result<Vec<GrowthPeriod>>;

    /// Daily prices up to and including `date`, newest first
    async fn get_price_history_ending(&self, symbol: &str, date: NaiveDate) -> Result<Vec<PricePoint>>;
}

#[async_trait::async_trait]
impl<'a, T: MarketDataProvider + ?Sized> MarketDataProvider for &'a T {
    async fn list_tradable_instruments(&self) -> Result<Vec<InstrumentSummary>> {
        (**self).list_tradable_instruments().await
    }

    async fn get_profile(&self, symbol: &str) -> Result<InstrumentProfile> {
        (**self).get_profile(symbol).await
    }

    async fn get_growth_history(
        &self,
        symbol: &str,
        period: ReportingPeriod,
        limit: usize,
    ) -> Result<Vec<GrowthPeriod>> {
        (**self).get_growth_history(symbol, period, limit).await
    }

    async fn get_price_history_ending(&self, symbol: &str, date: NaiveDate) -> Result<Vec<PricePoint>> {
        (**self).get_price_history_ending(symbol, date).await
    }
}
