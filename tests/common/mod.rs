//! Common test utilities and helpers


pub use api_mock::{MemorySink, StubProvider};

/// Test data utilities
pub mod test_data {
    use chrono::NaiveDate;
    use equity_screener::models::{
        GrowthPeriod, InstrumentProfile, InstrumentSummary, InstrumentType, PricePoint, ScreeningRow,
    };

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Run date shared by the pipeline tests
    pub fn run_date() -> NaiveDate {
        date(2024, 6, 1)
    }

    pub fn create_test_instrument(symbol: &str, instrument_type: InstrumentType, price: f64) -> InstrumentSummary {
        InstrumentSummary {
            symbol: symbol.to_string(),
            name: Some(format!("{} Company", symbol)),
            exchange: Some("EURONEXT".to_string()),
            instrument_type,
            price,
        }
    }

    /// Profile that passes the default eligibility gate
    pub fn create_test_profile(symbol: &str, company_name: &str) -> InstrumentProfile {
        InstrumentProfile {
            symbol: symbol.to_string(),
            company_name: Some(company_name.to_string()),
            isin: Some(format!("FR{:0>10}", symbol.len())),
            ipo_date: Some(date(2001, 3, 15)),
            is_actively_trading: true,
            avg_volume: 750_000,
            country: Some("FR".to_string()),
            exchange_short_name: Some("EURONEXT".to_string()),
            sector: Some("Industrials".to_string()),
            industry: Some("Aerospace & Defense".to_string()),
        }
    }

    pub fn create_test_growth_period(on: NaiveDate) -> GrowthPeriod {
        GrowthPeriod {
            date: on,
            revenue_growth: Some(0.12),
            ebit_growth: Some(0.08),
            operating_income_growth: Some(0.07),
            net_income_growth: Some(-0.03),
            eps_growth: Some(-0.02),
            inventory_growth: Some(0.15),
            rd_expense_growth: None,
            debt_growth: Some(0.01),
            sga_expenses_growth: Some(0.04),
        }
    }

    pub fn create_test_price(on: NaiveDate, adj_close: f64) -> PricePoint {
        PricePoint {
            date: on,
            adj_close,
            volume: 1_000_000,
        }
    }

    pub fn create_test_row(symbol: &str, on: NaiveDate, adj_close: f64) -> ScreeningRow {
        let profile = create_test_profile(symbol, &format!("{} Company", symbol));
        let period = create_test_growth_period(on);
        let price = create_test_price(on, adj_close);
        ScreeningRow::assemble(&profile, false, &period, &price)
    }
}

/// Logging utilities for tests
pub mod logging {
    use std::sync::Once;
    use tracing::{debug, info};

    static INIT: Once = Once::new();

    /// Initialize test logging
    pub fn init_test_logging() {
        INIT.call_once(|| {
            // Another test binary may already have installed a subscriber
            let _ = tracing::subscriber::set_global_default(
                tracing_subscriber::fmt()
                    .with_env_filter("equity_screener=debug,main=debug")
                    .with_test_writer()
                    .finish(),
            );
        });
    }

    /// Log test step
    pub fn log_test_step(step: &str) {
        info!("Test Step: {}", step);
    }

    /// Log test data
    pub fn log_test_data<T: std::fmt::Debug>(label: &str, data: &T) {
        debug!("{}: {:?}", label, data);
    }
}
